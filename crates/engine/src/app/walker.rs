use crate::puzzle::{Rect, Vec2};

pub const WALKER_WIDTH: i32 = 30;
pub const WALKER_HEIGHT: i32 = 60;
const FOOTPRINT_HEIGHT: i32 = 10;
const WALK_FRAME_COUNT: usize = 3;
const ANIMATION_STEP_PER_TICK: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn as_str(self) -> &'static str {
        match self {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }

    fn from_delta(dx: f32, dy: f32) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if dy > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }
}

/// The on-screen character. Purely cosmetic: it never touches puzzle state and
/// only reads the active room's obstacles.
#[derive(Debug, Clone)]
pub struct Walker {
    position: Vec2,
    target: Option<Vec2>,
    speed: f32,
    facing: Facing,
    frame: usize,
    animation_timer: f32,
}

impl Walker {
    pub fn new(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            target: None,
            speed: if speed.is_finite() && speed > 0.0 {
                speed
            } else {
                1.0
            },
            facing: Facing::Right,
            frame: 0,
            animation_timer: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn is_walking(&self) -> bool {
        self.target.is_some()
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = Some(target);
    }

    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.stop();
    }

    /// Sprite-sized box centered on the walker's position.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x.round() as i32 - WALKER_WIDTH / 2,
            self.position.y.round() as i32 - WALKER_HEIGHT / 2,
            WALKER_WIDTH,
            WALKER_HEIGHT,
        )
    }

    /// Only the feet collide, so the walker can pass in front of tall furniture.
    pub fn footprint_at(position: Vec2) -> Rect {
        Rect::new(
            position.x.round() as i32 - WALKER_WIDTH / 2,
            position.y.round() as i32 + WALKER_HEIGHT / 2 - FOOTPRINT_HEIGHT,
            WALKER_WIDTH,
            FOOTPRINT_HEIGHT,
        )
    }

    /// Advances one fixed tick. Stops in place rather than stepping into an
    /// obstacle.
    pub fn update(&mut self, obstacles: &[Rect]) {
        let Some(target) = self.target else {
            return;
        };
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let distance = dx.hypot(dy);

        if distance <= self.speed {
            if self.blocked_at(target, obstacles) {
                self.stop();
                return;
            }
            self.position = target;
            self.stop();
            return;
        }

        let next = Vec2::new(
            self.position.x + self.speed * dx / distance,
            self.position.y + self.speed * dy / distance,
        );
        self.facing = Facing::from_delta(dx, dy);
        if self.blocked_at(next, obstacles) {
            self.stop();
            return;
        }
        self.position = next;

        self.animation_timer += ANIMATION_STEP_PER_TICK;
        if self.animation_timer >= 1.0 {
            self.animation_timer = 0.0;
            self.frame = (self.frame + 1) % WALK_FRAME_COUNT;
        }
    }

    fn blocked_at(&self, position: Vec2, obstacles: &[Rect]) -> bool {
        let footprint = Self::footprint_at(position);
        obstacles.iter().any(|obstacle| obstacle.intersects(&footprint))
    }

    fn stop(&mut self) {
        self.target = None;
        self.frame = 0;
        self.animation_timer = 0.0;
    }
}
