use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Action indices. The reverse of the current heading is the only illegal move.
pub const UP: usize = 0;
pub const DOWN: usize = 1;
pub const LEFT: usize = 2;
pub const RIGHT: usize = 3;

pub const NUM_ACTIONS: usize = 4;

/// A board cell. Signed so that off-board head positions are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Outcome of a single environment transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepResult {
    pub reward: f32,
    pub done: bool,
    pub food_eaten: bool,
    pub won: bool,
}

fn delta(action: usize) -> (i32, i32) {
    match action {
        UP => (0, -1),
        DOWN => (0, 1),
        LEFT => (-1, 0),
        _ => (1, 0),
    }
}

fn direction_scalar(action: usize) -> f32 {
    match action {
        UP => 0.25,
        DOWN => 0.5,
        LEFT => 0.75,
        _ => 1.0,
    }
}

/// Single-agent Snake on an N×N grid with deterministic, seeded food placement.
///
/// The body is stored head-first. Cloning an environment clones the RNG stream,
/// so a clone replays food spawns identically to the original.
#[derive(Clone)]
pub struct SnakeEnv {
    board_size: i32,
    max_steps: u32,
    steps: u32,
    steps_since_food: u32,
    direction: usize,
    done: bool,
    won: bool,
    snake: VecDeque<Point>,
    food: Point,
    rng: StdRng,
}

impl SnakeEnv {
    pub fn new(board_size: usize, max_steps: u32, seed: u64) -> Self {
        let mut env = Self {
            board_size: board_size as i32,
            max_steps,
            steps: 0,
            steps_since_food: 0,
            direction: RIGHT,
            done: false,
            won: false,
            snake: VecDeque::new(),
            food: Point { x: 0, y: 0 },
            rng: StdRng::seed_from_u64(seed),
        };
        env.reset_with_seed(seed);
        env
    }

    /// Re-initialise the board, reseeding the food RNG.
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.reset();
    }

    /// Re-initialise the board, keeping the current food RNG stream.
    pub fn reset(&mut self) {
        self.done = false;
        self.won = false;
        self.steps = 0;
        self.steps_since_food = 0;
        self.direction = RIGHT;

        self.snake.clear();
        let cx = self.board_size / 2;
        let cy = self.board_size / 2;
        self.snake.push_back(Point { x: cx, y: cy });
        self.snake.push_back(Point { x: cx - 1, y: cy });
        self.snake.push_back(Point { x: cx - 2, y: cy });

        self.spawn_food();
    }

    fn is_reverse(&self, action: usize) -> bool {
        matches!(
            (action, self.direction),
            (UP, DOWN) | (DOWN, UP) | (LEFT, RIGHT) | (RIGHT, LEFT)
        )
    }

    fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.board_size && p.y < self.board_size
    }

    fn hits_body(&self, p: Point) -> bool {
        self.snake.iter().any(|s| *s == p)
    }

    fn next_head(&self, action: usize) -> Point {
        let (dx, dy) = delta(action);
        let h = self.snake[0];
        Point {
            x: h.x + dx,
            y: h.y + dy,
        }
    }

    pub fn step(&mut self, action: usize) -> StepResult {
        let mut out = StepResult::default();
        if self.done {
            out.done = true;
            out.won = self.won;
            return out;
        }

        let action = if action >= NUM_ACTIONS || self.is_reverse(action) {
            self.direction
        } else {
            action
        };
        self.direction = action;

        let h2 = self.next_head(action);
        let grow = h2 == self.food;

        if !self.in_bounds(h2) {
            self.done = true;
            out.reward = -1.0;
            out.done = true;
            return out;
        }

        // The tail vacates its cell this tick unless the snake grows.
        let tail = *self.snake.back().expect("snake body is never empty");
        let body_hit = self
            .snake
            .iter()
            .enumerate()
            .any(|(i, s)| !(!grow && i == self.snake.len() - 1 && *s == tail) && *s == h2);
        if body_hit {
            self.done = true;
            out.reward = -1.0;
            out.done = true;
            return out;
        }

        self.snake.push_front(h2);
        if grow {
            out.reward = 1.0;
            out.food_eaten = true;
            self.steps_since_food = 0;
            if self.snake.len() >= (self.board_size * self.board_size) as usize {
                self.done = true;
                self.won = true;
                out.done = true;
                out.won = true;
                return out;
            }
            self.spawn_food();
        } else {
            self.snake.pop_back();
            self.steps_since_food += 1;
        }

        self.steps += 1;

        // Starvation cap: board_size² steps is ample to reach any cell, so a
        // snake that circles without eating is cut off instead of burning
        // search budget until max_steps.
        let starvation_limit = (self.board_size * self.board_size) as u32;
        if self.steps_since_food >= starvation_limit || self.steps >= self.max_steps {
            self.done = true;
            out.done = true;
            return out;
        }

        out
    }

    /// Four N×N planes: body occupancy, head one-hot, food one-hot, and a
    /// constant plane encoding the current heading. Row-major `y*N + x`.
    pub fn state_tensor(&self) -> Vec<f32> {
        let n = self.board_size as usize;
        let size = n * n;
        let mut st = vec![0.0f32; 4 * size];

        for s in &self.snake {
            st[(s.y as usize) * n + s.x as usize] = 1.0;
        }

        let h = self.snake[0];
        st[size + (h.y as usize) * n + h.x as usize] = 1.0;

        st[2 * size + (self.food.y as usize) * n + self.food.x as usize] = 1.0;

        let dir_val = direction_scalar(self.direction);
        for cell in st[3 * size..].iter_mut() {
            *cell = dir_val;
        }

        st
    }

    pub fn legal_mask(&self) -> [bool; NUM_ACTIONS] {
        let mut mask = [true; NUM_ACTIONS];
        match self.direction {
            UP => mask[DOWN] = false,
            DOWN => mask[UP] = false,
            LEFT => mask[RIGHT] = false,
            _ => mask[LEFT] = false,
        }
        mask
    }

    pub fn free_cells(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity((self.board_size * self.board_size) as usize);
        for y in 0..self.board_size {
            for x in 0..self.board_size {
                let p = Point { x, y };
                if !self.hits_body(p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Move the food, ignoring out-of-bounds or body-occupied targets.
    pub fn set_food(&mut self, p: Point) {
        if self.in_bounds(p) && !self.hits_body(p) {
            self.food = p;
        }
    }

    fn spawn_food(&mut self) {
        let free = self.free_cells();
        if free.is_empty() {
            self.done = true;
            self.won = true;
            return;
        }
        self.food = free[self.rng.gen_range(0..free.len())];
    }

    pub fn board_size(&self) -> usize {
        self.board_size as usize
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn direction(&self) -> usize {
        self.direction
    }

    pub fn snake_length(&self) -> usize {
        self.snake.len()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_win(&self) -> bool {
        self.won
    }

    pub fn snake(&self) -> &VecDeque<Point> {
        &self.snake
    }

    pub fn food(&self) -> Point {
        self.food
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_action_is_substituted() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        env.set_food(Point { x: 0, y: 0 });
        let head0 = env.snake()[0];
        // LEFT is the direct reverse of the initial RIGHT heading.
        let st = env.step(LEFT);
        let head1 = env.snake()[0];
        assert!(!st.done);
        assert_eq!(st.reward, 0.0);
        assert_eq!(head1.x, head0.x + 1);
        assert_eq!(head1.y, head0.y);
    }

    #[test]
    fn eating_food_grows_and_rewards() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        let h = env.snake()[0];
        env.set_food(Point { x: h.x + 1, y: h.y });
        let len0 = env.snake_length();

        let st = env.step(RIGHT);
        assert_eq!(st.reward, 1.0);
        assert!(st.food_eaten);
        assert!(!st.done);
        assert_eq!(env.snake_length(), len0 + 1);
    }

    #[test]
    fn running_into_the_wall_loses() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        let mut st = StepResult::default();
        for _ in 0..20 {
            st = env.step(RIGHT);
            if st.done {
                break;
            }
        }
        assert!(st.done);
        assert_eq!(st.reward, -1.0);
        assert!(!st.won);
        assert!(!env.is_win());
    }

    #[test]
    fn state_tensor_planes() {
        let env = SnakeEnv::new(10, 1000, 123);
        let st = env.state_tensor();
        assert_eq!(st.len(), 4 * 10 * 10);

        let body: f32 = st[0..100].iter().sum();
        let head: f32 = st[100..200].iter().sum();
        let food: f32 = st[200..300].iter().sum();
        assert_eq!(body, env.snake_length() as f32);
        assert_eq!(head, 1.0);
        assert_eq!(food, 1.0);
        assert!(st[300..].iter().all(|&v| v == direction_scalar(RIGHT)));
    }

    #[test]
    fn legal_mask_blocks_exactly_the_reverse() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        assert_eq!(env.legal_mask(), [true, true, false, true]);
        env.step(UP);
        assert_eq!(env.legal_mask(), [true, false, true, true]);
    }

    #[test]
    fn starvation_ends_circling_games() {
        let mut env = SnakeEnv::new(5, 1000, 7);
        // Park the food in a corner the loop never touches.
        env.set_food(Point { x: 0, y: 0 });

        let cycle = [RIGHT, DOWN, LEFT, UP];
        let mut last = StepResult::default();
        'outer: for _ in 0..30 {
            for &a in &cycle {
                last = env.step(a);
                if last.done {
                    break 'outer;
                }
            }
        }
        assert!(last.done);
        assert_eq!(last.reward, 0.0);
        assert!(!last.won);
    }

    #[test]
    fn step_after_done_is_inert() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        while !env.step(RIGHT).done {}
        let len = env.snake_length();
        let st = env.step(UP);
        assert!(st.done);
        assert_eq!(st.reward, 0.0);
        assert_eq!(env.snake_length(), len);
    }

    #[test]
    fn body_stays_distinct_and_in_bounds() {
        let mut env = SnakeEnv::new(8, 500, 42);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let st = env.step(rng.gen_range(0..NUM_ACTIONS));
            let n = env.board_size() as i32;
            for (i, a) in env.snake().iter().enumerate() {
                assert!(a.x >= 0 && a.y >= 0 && a.x < n && a.y < n);
                for b in env.snake().iter().skip(i + 1) {
                    assert_ne!(a, b);
                }
            }
            if st.done {
                break;
            }
        }
    }

    #[test]
    fn same_seed_replays_food_spawns() {
        let mut a = SnakeEnv::new(10, 1000, 555);
        let mut b = SnakeEnv::new(10, 1000, 555);
        assert_eq!(a.food(), b.food());
        for _ in 0..50 {
            let sa = a.step(RIGHT);
            let sb = b.step(RIGHT);
            assert_eq!(a.food(), b.food());
            assert_eq!(sa.done, sb.done);
            if sa.done {
                break;
            }
        }
    }

    #[test]
    fn set_food_ignores_invalid_targets() {
        let mut env = SnakeEnv::new(10, 1000, 123);
        let before = env.food();
        env.set_food(Point { x: -1, y: 0 });
        assert_eq!(env.food(), before);
        let body_cell = env.snake()[1];
        env.set_food(body_cell);
        assert_eq!(env.food(), before);
    }
}
