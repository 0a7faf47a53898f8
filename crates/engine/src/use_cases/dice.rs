//! Standalone dice rolls outside of combat.

use std::sync::Arc;

use questline_domain::value_objects::dice;
use questline_domain::DiceRollResult;

use crate::infrastructure::ports::RandomPort;
use crate::use_cases::action::ActionError;

pub struct RollDice {
    random: Arc<dyn RandomPort>,
}

impl RollDice {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    pub fn execute(&self, notation: &str) -> Result<DiceRollResult, ActionError> {
        let mut rng = |min, max| self.random.gen_range(min, max);
        let result = dice::roll(notation, &mut rng)?;
        tracing::debug!(notation, total = result.total, "Dice rolled");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockRandomPort;
    use mockall::predicate::eq;
    use questline_domain::DiceParseError;

    #[test]
    fn rolls_through_the_random_port() {
        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .with(eq(1), eq(8))
            .times(2)
            .returning(|_, max| max);

        let result = RollDice::new(Arc::new(random)).execute("2d8+3").unwrap();

        assert_eq!(result.individual_rolls, vec![8, 8]);
        assert_eq!(result.total, 19);
    }

    #[test]
    fn bad_notation_is_an_invalid_notation_error() {
        let random = MockRandomPort::new();

        let err = RollDice::new(Arc::new(random)).execute("3x7").unwrap_err();

        assert!(matches!(err, ActionError::InvalidNotation(_)));
    }

    #[test]
    fn oversized_modifier_is_refused_before_rolling() {
        let mut random = MockRandomPort::new();
        random.expect_gen_range().never();

        let err = RollDice::new(Arc::new(random))
            .execute("1d6+2147483647")
            .unwrap_err();

        assert!(matches!(
            err,
            ActionError::InvalidNotation(DiceParseError::InvalidModifier)
        ));
    }
}
