use crate::app::walker::Walker;
use crate::puzzle::{GameSession, InteractiveObject, Rect, Vec2};

use super::canvas::{Canvas, Sprite};
use super::text::{draw_text, draw_text_centered, line_height, max_chars, text_width, wrap_text};

const CLEAR_COLOR: [u8; 4] = [35, 38, 47, 255];
const FLOOR_COLOR: [u8; 4] = [52, 48, 58, 255];
const OBSTACLE_TINT: [u8; 4] = [0, 0, 0, 60];
const STATUS_BAR_HEIGHT: i32 = 40;
const STATUS_BAR_COLOR: [u8; 4] = [18, 20, 26, 255];
const STATUS_TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const DIM_TEXT_COLOR: [u8; 4] = [176, 198, 220, 255];
const STATUS_TEXT_SCALE: i32 = 2;
const LOCKED_OUTLINE_COLOR: [u8; 4] = [200, 80, 80, 255];
const UNLOCKED_OUTLINE_COLOR: [u8; 4] = [110, 200, 120, 255];
const HOVER_HIGHLIGHT_COLOR: [u8; 4] = [255, 210, 70, 255];
const OBJECT_LABEL_COLOR: [u8; 4] = [20, 20, 24, 255];
const SLOT_COLOR: [u8; 4] = [28, 30, 38, 255];
const SLOT_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const HELD_SLOT_BORDER_COLOR: [u8; 4] = [255, 210, 70, 255];
const ICON_INSET: i32 = 16;
const PANEL_WIDTH: i32 = 360;
const PANEL_HEIGHT: i32 = 180;
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 235];
const PANEL_BORDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const PANEL_CODE_SCALE: i32 = 6;
const REJECTED_CODE_COLOR: [u8; 4] = [235, 90, 90, 255];
const WIN_SHADE_COLOR: [u8; 4] = [0, 0, 0, 170];
const WIN_TEXT_COLOR: [u8; 4] = [255, 226, 120, 255];
const WALKER_PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const SHAKE_DURATION_TICKS: u32 = 18;
const SHAKE_AMPLITUDE_PX: f32 = 10.0;

/// What the code panel showed when a code was rejected. The lock session is
/// gone by then, so the renderer keeps its own copy for the shake.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PanelGhost {
    title: String,
    display: String,
}

/// Horizontal shake of the code panel after a rejected code.
#[derive(Debug, Clone, Default)]
pub struct PanelShake {
    remaining_ticks: u32,
    ghost: Option<PanelGhost>,
}

impl PanelShake {
    pub fn trigger(&mut self, title: impl Into<String>, display: impl Into<String>) {
        self.remaining_ticks = SHAKE_DURATION_TICKS;
        self.ghost = Some(PanelGhost {
            title: title.into(),
            display: display.into(),
        });
    }

    pub fn tick(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        if self.remaining_ticks == 0 {
            self.ghost = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    pub fn offset_px(&self) -> i32 {
        if self.remaining_ticks == 0 {
            return 0;
        }
        let decay = self.remaining_ticks as f32 / SHAKE_DURATION_TICKS as f32;
        ((self.remaining_ticks as f32 * 1.3).sin() * SHAKE_AMPLITUDE_PX * decay).round() as i32
    }
}

pub(crate) struct FrameView<'a> {
    pub session: &'a GameSession,
    pub walker: &'a Walker,
    pub walker_sprite: Option<&'a Sprite>,
    pub cursor: Option<Vec2>,
    pub shake: &'a PanelShake,
}

pub(crate) fn draw_frame(canvas: &mut Canvas<'_>, view: &FrameView<'_>) {
    canvas.clear(CLEAR_COLOR);
    let session = view.session;
    let room_area = Rect::new(
        0,
        STATUS_BAR_HEIGHT,
        canvas.width() as i32,
        session.inventory().layout().origin_y - STATUS_BAR_HEIGHT - 12,
    );
    canvas.fill_rect(room_area, FLOOR_COLOR);
    for obstacle in session.obstacles() {
        canvas.blend_rect(*obstacle, OBSTACLE_TINT);
    }

    let hovered = match (session.code_lock(), session.won(), view.cursor) {
        (None, false, Some(cursor)) => session.active_room().hit_test(cursor),
        _ => None,
    };
    for (index, object) in session.active_room().objects().iter().enumerate() {
        if object.visible {
            draw_object(canvas, object, hovered == Some(index));
        }
    }

    draw_walker(canvas, view.walker, view.walker_sprite);
    draw_status_bar(canvas, session);
    draw_inventory(canvas, session);

    let offset_px = view.shake.offset_px();
    if let Some(code_lock) = session.code_lock() {
        let title = session
            .active_room()
            .object(code_lock.target())
            .map(|object| object.name.as_str())
            .unwrap_or("Lock");
        draw_code_panel(
            canvas,
            title,
            &code_lock.display_text(),
            STATUS_TEXT_COLOR,
            offset_px,
        );
    } else if let (true, Some(ghost)) = (view.shake.is_active(), &view.shake.ghost) {
        draw_code_panel(canvas, &ghost.title, &ghost.display, REJECTED_CODE_COLOR, offset_px);
    }
    if session.won() {
        draw_win_overlay(canvas);
    }
}

fn draw_object(canvas: &mut Canvas<'_>, object: &InteractiveObject, hovered: bool) {
    let [r, g, b] = object.color;
    canvas.fill_rect(object.bounds, [r, g, b, 255]);
    let outline = if object.locked {
        LOCKED_OUTLINE_COLOR
    } else {
        UNLOCKED_OUTLINE_COLOR
    };
    canvas.outline_rect(object.bounds, 2, outline);
    if hovered {
        canvas.outline_rect(object.bounds.inflate(8, 8), 2, HOVER_HIGHLIGHT_COLOR);
    }

    let label_scale = if text_width(&object.name, 2) <= object.bounds.width - 8 {
        2
    } else {
        1
    };
    draw_text_centered(
        canvas,
        object.bounds.center().x as i32,
        object.bounds.y + 6,
        &object.name,
        label_scale,
        OBJECT_LABEL_COLOR,
    );
}

fn draw_walker(canvas: &mut Canvas<'_>, walker: &Walker, sprite: Option<&Sprite>) {
    let bounds = walker.bounds();
    match sprite {
        Some(sprite) => canvas.blit_sprite(sprite, bounds),
        None => {
            canvas.fill_rect(bounds.inflate(-10, -4), WALKER_PLACEHOLDER_COLOR);
            let head = Rect::new(bounds.center().x as i32 - 7, bounds.y, 14, 14);
            canvas.fill_rect(head, WALKER_PLACEHOLDER_COLOR);
        }
    }
}

fn draw_status_bar(canvas: &mut Canvas<'_>, session: &GameSession) {
    let width = canvas.width() as i32;
    canvas.fill_rect_xywh(0, 0, width, STATUS_BAR_HEIGHT, STATUS_BAR_COLOR);

    let room_label = format!("[{}]", session.active_room().name);
    let room_label_width = text_width(&room_label, STATUS_TEXT_SCALE);
    draw_text(
        canvas,
        width - room_label_width - 12,
        13,
        &room_label,
        STATUS_TEXT_SCALE,
        DIM_TEXT_COLOR,
    );

    let available = width - room_label_width - 36;
    let lines = wrap_text(
        session.status_message(),
        max_chars(available, STATUS_TEXT_SCALE),
    );
    let scale = if lines.len() > 1 { 1 } else { STATUS_TEXT_SCALE };
    let lines = if scale == STATUS_TEXT_SCALE {
        lines
    } else {
        wrap_text(session.status_message(), max_chars(available, scale))
    };
    let mut y = if lines.len() > 1 { 6 } else { 13 };
    for line in lines.iter().take(4) {
        draw_text(canvas, 12, y, line, scale, STATUS_TEXT_COLOR);
        y += line_height(scale);
    }
}

fn draw_inventory(canvas: &mut Canvas<'_>, session: &GameSession) {
    let inventory = session.inventory();
    let held = session.held_item();
    for index in 0..inventory.capacity() {
        let slot = inventory.slot_rect(index);
        canvas.fill_rect(slot, SLOT_COLOR);
        let item = inventory.items().get(index);
        let is_held = matches!((item, held), (Some(item), Some(held)) if item.name == held.name);
        let border = if is_held {
            HELD_SLOT_BORDER_COLOR
        } else {
            SLOT_BORDER_COLOR
        };
        canvas.outline_rect(slot, if is_held { 3 } else { 1 }, border);

        let Some(item) = item else {
            continue;
        };
        let [r, g, b] = item.icon_color;
        let icon = Rect::new(
            slot.x + ICON_INSET,
            slot.y + 8,
            slot.width - ICON_INSET * 2,
            slot.height - ICON_INSET - 20,
        );
        canvas.fill_rect(icon, [r, g, b, 255]);
        let label_scale = if text_width(&item.name, 2) <= slot.width - 6 {
            2
        } else {
            1
        };
        draw_text_centered(
            canvas,
            slot.center().x as i32,
            slot.bottom() - 18,
            &item.name,
            label_scale,
            STATUS_TEXT_COLOR,
        );
    }

    if let Some(held) = held {
        let layout = inventory.layout();
        draw_text(
            canvas,
            layout.origin_x,
            layout.origin_y - 18,
            &format!("Holding: {}", held.name),
            STATUS_TEXT_SCALE,
            HELD_SLOT_BORDER_COLOR,
        );
    }
}

fn draw_code_panel(
    canvas: &mut Canvas<'_>,
    title: &str,
    display: &str,
    code_color: [u8; 4],
    offset_px: i32,
) {
    let center_x = canvas.width() as i32 / 2 + offset_px;
    let panel = Rect::new(
        center_x - PANEL_WIDTH / 2,
        canvas.height() as i32 / 2 - PANEL_HEIGHT / 2 - 40,
        PANEL_WIDTH,
        PANEL_HEIGHT,
    );
    canvas.blend_rect(panel, PANEL_BG_COLOR);
    canvas.outline_rect(panel, 2, PANEL_BORDER_COLOR);

    draw_text_centered(canvas, center_x, panel.y + 16, title, 3, STATUS_TEXT_COLOR);
    draw_text_centered(
        canvas,
        center_x,
        panel.y + 64,
        &spaced(display),
        PANEL_CODE_SCALE,
        code_color,
    );
    draw_text_centered(
        canvas,
        center_x,
        panel.bottom() - 28,
        "Enter: submit  Esc: cancel",
        2,
        DIM_TEXT_COLOR,
    );
}

fn spaced(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for (index, ch) in text.chars().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

fn draw_win_overlay(canvas: &mut Canvas<'_>) {
    let screen = Rect::new(0, 0, canvas.width() as i32, canvas.height() as i32);
    canvas.blend_rect(screen, WIN_SHADE_COLOR);
    let center = screen.center();
    draw_text_centered(
        canvas,
        center.x as i32,
        center.y as i32 - 40,
        "You escaped!",
        6,
        WIN_TEXT_COLOR,
    );
    draw_text_centered(
        canvas,
        center.x as i32,
        center.y as i32 + 20,
        "Press Esc to quit",
        2,
        DIM_TEXT_COLOR,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{
        BehaviorKind, ExitTarget, Inventory, PuzzleKey, Room, SCREEN_HEIGHT, SCREEN_WIDTH,
    };

    fn session() -> GameSession {
        let room = Room::new("study", "Study", "Find a way out.")
            .with_object(
                InteractiveObject::new(
                    "drawer",
                    "Drawer",
                    Rect::new(180, 300, 160, 100),
                    BehaviorKind::CodeContainer,
                )
                .locked(true)
                .with_code("314")
                .with_color([120, 90, 60]),
            )
            .with_object(
                InteractiveObject::new(
                    "door",
                    "Door",
                    Rect::new(800, 120, 120, 240),
                    BehaviorKind::Exit {
                        key: None,
                        leads_to: ExitTarget::Escape,
                    },
                )
                .with_color([90, 60, 40]),
            );
        GameSession::new(vec![room], Inventory::new(7)).expect("session")
    }

    fn render(session: &GameSession) -> Vec<u8> {
        render_with_shake(session, &PanelShake::default())
    }

    fn render_with_shake(session: &GameSession, shake: &PanelShake) -> Vec<u8> {
        let walker = Walker::new(Vec2::new(480.0, 300.0), 2.0);
        let mut frame = vec![0u8; (SCREEN_WIDTH * SCREEN_HEIGHT * 4) as usize];
        let mut canvas = Canvas::new(&mut frame, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        draw_frame(
            &mut canvas,
            &FrameView {
                session,
                walker: &walker,
                walker_sprite: None,
                cursor: None,
                shake,
            },
        );
        frame
    }

    fn pixel(frame: &[u8], x: i32, y: i32) -> [u8; 4] {
        let offset = ((y * SCREEN_WIDTH + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn objects_draw_in_their_color_with_lock_outline() {
        let frame = render(&session());
        assert_eq!(pixel(&frame, 250, 390), [120, 90, 60, 255]);
        assert_eq!(pixel(&frame, 180, 350), LOCKED_OUTLINE_COLOR);
        assert_eq!(pixel(&frame, 800, 300), UNLOCKED_OUTLINE_COLOR);
    }

    #[test]
    fn code_panel_covers_the_room_while_open() {
        let mut session = session();
        let closed = render(&session);
        session.pointer_down(Vec2::new(200.0, 320.0));
        session.key_down(PuzzleKey::Digit(3));
        let open = render(&session);

        let panel_corner = (
            SCREEN_WIDTH / 2 - PANEL_WIDTH / 2,
            SCREEN_HEIGHT / 2 - PANEL_HEIGHT / 2 - 40,
        );
        assert_ne!(
            pixel(&closed, panel_corner.0, panel_corner.1),
            pixel(&open, panel_corner.0, panel_corner.1)
        );
        assert_eq!(pixel(&open, panel_corner.0, panel_corner.1), PANEL_BORDER_COLOR);
    }

    #[test]
    fn win_overlay_darkens_the_scene() {
        let mut session = session();
        let before = render(&session);
        session.pointer_down(Vec2::new(850.0, 200.0));
        assert!(session.won());
        let after = render(&session);

        let sample = pixel(&before, 600, 200);
        let shaded = pixel(&after, 600, 200);
        assert!(shaded[0] < sample[0]);
    }

    #[test]
    fn rejected_code_panel_lingers_while_shaking() {
        let session = session();
        let mut shake = PanelShake::default();
        shake.trigger("Drawer", "999");
        shake.tick();
        let frame = render_with_shake(&session, &shake);
        let top = SCREEN_HEIGHT / 2 - PANEL_HEIGHT / 2 - 40;
        let shaken_left = SCREEN_WIDTH / 2 + shake.offset_px() - PANEL_WIDTH / 2;
        assert_eq!(pixel(&frame, shaken_left, top), PANEL_BORDER_COLOR);

        while shake.is_active() {
            shake.tick();
        }
        let frame = render_with_shake(&session, &shake);
        let left = SCREEN_WIDTH / 2 - PANEL_WIDTH / 2;
        assert_ne!(pixel(&frame, left, top), PANEL_BORDER_COLOR);
    }

    #[test]
    fn shake_decays_to_rest() {
        let mut shake = PanelShake::default();
        assert_eq!(shake.offset_px(), 0);
        shake.trigger("Drawer", "999");
        assert!(shake.is_active());
        let offsets = (0..SHAKE_DURATION_TICKS)
            .map(|_| {
                let offset = shake.offset_px();
                shake.tick();
                offset
            })
            .collect::<Vec<_>>();
        assert!(offsets.iter().any(|offset| *offset != 0));
        assert!(offsets.iter().all(|offset| offset.abs() <= SHAKE_AMPLITUDE_PX as i32));
        assert!(!shake.is_active());
        assert_eq!(shake.offset_px(), 0);
        assert!(shake.ghost.is_none());
    }

    #[test]
    fn code_display_is_spaced_for_readability() {
        assert_eq!(spaced("3__"), "3 _ _");
        assert_eq!(spaced(""), "");
    }
}
