//! Game logic and rendering of [`Breakout`].
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Width of a rendered frame.
pub const WIDTH: usize = 160;

/// Height of a rendered frame.
pub const HEIGHT: usize = 210;

const WALL_TOP: f32 = 32.0;
const WALL_LEFT: f32 = 8.0;
const WALL_RIGHT: f32 = 152.0;
const WALL_BOTTOM: usize = 196;

const BRICK_TOP: f32 = 57.0;
const BRICK_ROWS: usize = 6;
const BRICK_COLS: usize = 18;
const BRICK_W: f32 = 8.0;
const BRICK_H: f32 = 6.0;
const ROW_REWARDS: [u32; BRICK_ROWS] = [7, 7, 4, 4, 1, 1];
const ROW_COLORS: [[u8; 3]; BRICK_ROWS] = [
    [200, 72, 72],
    [198, 108, 58],
    [180, 122, 48],
    [162, 162, 42],
    [72, 160, 72],
    [66, 72, 200],
];

const PADDLE_Y: f32 = 189.0;
const PADDLE_W: f32 = 16.0;
const PADDLE_H: f32 = 4.0;
const PADDLE_SPEED: f32 = 3.0;

const BALL_W: f32 = 2.0;
const BALL_H: f32 = 4.0;
const BALL_SERVE_Y: f32 = 100.0;
const BALL_SPEED_Y: f32 = 2.0;
const BALL_MAX_SPEED_X: f32 = 2.0;
const BALL_MIN_SPEED_X: f32 = 0.5;

const N_LIVES: usize = 5;

const WALL_COLOR: [u8; 3] = [142, 142, 142];
const PADDLE_COLOR: [u8; 3] = [200, 72, 72];

/// Actions of [`Breakout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakoutAction {
    /// Do nothing.
    Noop = 0,

    /// Serve the ball if it is not in play.
    Fire = 1,

    /// Move the paddle to the right.
    Right = 2,

    /// Move the paddle to the left.
    Left = 3,
}

impl BreakoutAction {
    /// The number of actions.
    pub const COUNT: usize = 4;

    /// Returns the action of the given index.
    pub fn from_index(ix: usize) -> Option<Self> {
        match ix {
            0 => Some(Self::Noop),
            1 => Some(Self::Fire),
            2 => Some(Self::Right),
            3 => Some(Self::Left),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ball {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

/// A brick-breaking game advanced one frame per action.
///
/// Breaking a brick gives 1, 4 or 7 points depending on its row. A new wall of
/// bricks appears when the last one is broken. Missing the ball costs a life and
/// the ball stays out of play until the next [`BreakoutAction::Fire`].
pub struct Breakout {
    bricks: [[bool; BRICK_COLS]; BRICK_ROWS],
    paddle_x: f32,
    ball: Option<Ball>,
    lives: usize,
    score: u32,
    rng: StdRng,
}

impl Breakout {
    /// Starts a new game.
    pub fn new(seed: u64) -> Self {
        let mut game = Self {
            bricks: [[true; BRICK_COLS]; BRICK_ROWS],
            paddle_x: 0.0,
            ball: None,
            lives: N_LIVES,
            score: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        game.reset();
        game
    }

    /// Reseeds the random number generator used for serving the ball.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Starts a new game with the current random number generator.
    pub fn reset(&mut self) {
        self.bricks = [[true; BRICK_COLS]; BRICK_ROWS];
        self.paddle_x = WALL_LEFT + (WALL_RIGHT - WALL_LEFT - PADDLE_W) / 2.0;
        self.ball = None;
        self.lives = N_LIVES;
        self.score = 0;
    }

    /// Returns the remaining lives.
    pub fn lives(&self) -> usize {
        self.lives
    }

    /// Returns `true` if no life remains.
    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    /// Returns the total score of the game.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Returns the number of remaining bricks.
    pub fn n_bricks(&self) -> usize {
        self.bricks.iter().flatten().filter(|&&b| b).count()
    }

    /// Returns the top-left corner of the ball, if it is in play.
    pub fn ball_position(&self) -> Option<(f32, f32)> {
        self.ball.map(|b| (b.x, b.y))
    }

    /// Returns the left edge of the paddle.
    pub fn paddle_x(&self) -> f32 {
        self.paddle_x
    }

    /// Advances the game by one frame and returns the points scored.
    pub fn act(&mut self, action: BreakoutAction) -> u32 {
        if self.is_game_over() {
            return 0;
        }

        match action {
            BreakoutAction::Noop => {}
            BreakoutAction::Fire => self.serve(),
            BreakoutAction::Right => self.move_paddle(PADDLE_SPEED),
            BreakoutAction::Left => self.move_paddle(-PADDLE_SPEED),
        }

        let reward = self.move_ball();
        self.score += reward;
        reward
    }

    fn move_paddle(&mut self, dx: f32) {
        self.paddle_x = (self.paddle_x + dx).clamp(WALL_LEFT, WALL_RIGHT - PADDLE_W);
    }

    fn serve(&mut self) {
        if self.ball.is_some() {
            return;
        }

        let x = self.rng.gen_range(WALL_LEFT + 8.0..WALL_RIGHT - 8.0);
        let speed = self.rng.gen_range(BALL_MIN_SPEED_X..1.5);
        let vx = if self.rng.gen::<bool>() { speed } else { -speed };
        self.ball = Some(Ball {
            x,
            y: BALL_SERVE_Y,
            vx,
            vy: BALL_SPEED_Y,
        });
    }

    fn brick_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < WALL_LEFT || x >= WALL_RIGHT || y < BRICK_TOP {
            return None;
        }

        let row = ((y - BRICK_TOP) / BRICK_H) as usize;
        let col = ((x - WALL_LEFT) / BRICK_W) as usize;
        if row < BRICK_ROWS && col < BRICK_COLS && self.bricks[row][col] {
            Some((row, col))
        } else {
            None
        }
    }

    fn move_ball(&mut self) -> u32 {
        let mut ball = match self.ball.take() {
            Some(ball) => ball,
            None => return 0,
        };
        let mut reward = 0;

        ball.x += ball.vx;
        ball.y += ball.vy;

        // Walls
        if ball.x < WALL_LEFT {
            ball.x = 2.0 * WALL_LEFT - ball.x;
            ball.vx = -ball.vx;
        }
        if ball.x + BALL_W > WALL_RIGHT {
            ball.x = 2.0 * (WALL_RIGHT - BALL_W) - ball.x;
            ball.vx = -ball.vx;
        }
        if ball.y < WALL_TOP {
            ball.y = 2.0 * WALL_TOP - ball.y;
            ball.vy = -ball.vy;
        }

        // Bricks, checked at the leading edge of the ball
        let edge_y = if ball.vy < 0.0 { ball.y } else { ball.y + BALL_H };
        if let Some((row, col)) = self.brick_at(ball.x + BALL_W / 2.0, edge_y) {
            self.bricks[row][col] = false;
            reward += ROW_REWARDS[row];
            ball.vy = -ball.vy;
            if self.n_bricks() == 0 {
                self.bricks = [[true; BRICK_COLS]; BRICK_ROWS];
            }
        }

        // Paddle
        let hits_paddle = ball.vy > 0.0
            && ball.y + BALL_H >= PADDLE_Y
            && ball.y <= PADDLE_Y + PADDLE_H
            && ball.x + BALL_W >= self.paddle_x
            && ball.x <= self.paddle_x + PADDLE_W;
        if hits_paddle {
            let offset = (ball.x + BALL_W / 2.0 - self.paddle_x - PADDLE_W / 2.0) / (PADDLE_W / 2.0);
            let vx = (offset * BALL_MAX_SPEED_X).clamp(-BALL_MAX_SPEED_X, BALL_MAX_SPEED_X);
            ball.vx = if vx.abs() >= BALL_MIN_SPEED_X {
                vx
            } else if ball.vx < 0.0 {
                -BALL_MIN_SPEED_X
            } else {
                BALL_MIN_SPEED_X
            };
            ball.y = PADDLE_Y - BALL_H;
            ball.vy = -ball.vy.abs();
        }

        if ball.y > HEIGHT as f32 {
            self.lives -= 1;
        } else {
            self.ball = Some(ball);
        }

        reward
    }

    /// Renders the current frame into `buf` as packed RGB of `WIDTH * HEIGHT * 3` bytes.
    pub fn render_rgb24(&self, buf: &mut [u8]) {
        buf.iter_mut().for_each(|p| *p = 0);

        fill_rect(buf, 0, WALL_TOP as usize - 8, WIDTH, WALL_TOP as usize, WALL_COLOR);
        fill_rect(buf, 0, WALL_TOP as usize, WALL_LEFT as usize, WALL_BOTTOM, WALL_COLOR);
        fill_rect(buf, WALL_RIGHT as usize, WALL_TOP as usize, WIDTH, WALL_BOTTOM, WALL_COLOR);

        for (row, bricks) in self.bricks.iter().enumerate() {
            let y0 = (BRICK_TOP + row as f32 * BRICK_H) as usize;
            for (col, _) in bricks.iter().enumerate().filter(|(_, b)| **b) {
                let x0 = (WALL_LEFT + col as f32 * BRICK_W) as usize;
                fill_rect(
                    buf,
                    x0,
                    y0,
                    x0 + BRICK_W as usize,
                    y0 + BRICK_H as usize,
                    ROW_COLORS[row],
                );
            }
        }

        let x0 = self.paddle_x as usize;
        let y0 = PADDLE_Y as usize;
        fill_rect(
            buf,
            x0,
            y0,
            x0 + PADDLE_W as usize,
            y0 + PADDLE_H as usize,
            PADDLE_COLOR,
        );

        if let Some(ball) = &self.ball {
            let x0 = ball.x.max(0.0) as usize;
            let y0 = ball.y.max(0.0) as usize;
            fill_rect(
                buf,
                x0,
                y0,
                x0 + BALL_W as usize,
                y0 + BALL_H as usize,
                PADDLE_COLOR,
            );
        }
    }
}

fn fill_rect(buf: &mut [u8], x0: usize, y0: usize, x1: usize, y1: usize, color: [u8; 3]) {
    for y in y0..y1.min(HEIGHT) {
        for x in x0..x1.min(WIDTH) {
            let i = (y * WIDTH + x) * 3;
            buf[i..i + 3].copy_from_slice(&color);
        }
    }
}
