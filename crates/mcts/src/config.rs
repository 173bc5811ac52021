/// Configuration for MCTS search
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Number of simulations to run per move
    pub num_simulations: u32,

    /// PUCT exploration constant
    pub c_puct: f32,

    /// Dirichlet alpha parameter for root noise
    pub dirichlet_alpha: f32,

    /// Dirichlet epsilon for mixing noise into the root priors
    pub dirichlet_eps: f32,

    /// Number of food placements to average a food-eating node's value over
    pub food_samples: u32,
}

impl MctsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    pub fn with_dirichlet(mut self, alpha: f32, eps: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_eps = eps;
        self
    }

    pub fn with_food_samples(mut self, n: u32) -> Self {
        self.food_samples = n.max(1);
        self
    }
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 400,
            c_puct: 1.0,
            dirichlet_alpha: 0.03,
            dirichlet_eps: 0.25,
            food_samples: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 400);
        assert_eq!(config.c_puct, 1.0);
        assert_eq!(config.food_samples, 8);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_simulations(64)
            .with_c_puct(2.0)
            .with_dirichlet(0.3, 0.1)
            .with_food_samples(0);

        assert_eq!(config.num_simulations, 64);
        assert_eq!(config.c_puct, 2.0);
        assert_eq!(config.dirichlet_alpha, 0.3);
        assert_eq!(config.dirichlet_eps, 0.1);
        // food_samples is clamped to at least one
        assert_eq!(config.food_samples, 1);
    }
}
