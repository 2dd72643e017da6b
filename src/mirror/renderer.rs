//! Frame rendering for a mirrored entity table

use crate::game::draw::Canvas;
use crate::game::entity::Entity;
use crate::game::tuning::ArenaTuning;

/// Clear the board, then draw every entity in its own translated and rotated frame
pub fn render_frame<'a>(
    canvas: &mut dyn Canvas,
    entities: impl IntoIterator<Item = &'a Entity>,
    tuning: &ArenaTuning,
) {
    canvas.clear_rect(0.0, 0.0, tuning.width, tuning.height);

    for entity in entities {
        let body = entity.body();
        canvas.save();
        canvas.translate(body.x, body.y);
        canvas.rotate(body.angle);
        entity.draw(canvas, tuning);
        canvas.restore();
    }
}
