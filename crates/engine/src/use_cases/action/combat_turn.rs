//! Combat rounds: mechanics first, narration second.
//!
//! The round is fully resolved before the narrator is called, and the
//! narrator's reply contributes prose only.

use questline_domain::game_systems::combat;
use questline_domain::{CharacterState, CombatRoundOutcome, GameSession, StateChanges};

use super::{ActionError, ProcessAction, TurnOutcome};
use crate::use_cases::narration::prompt::{
    build_context, combat_outcome_prompt, combat_system_prompt,
};
use crate::use_cases::narration::{parse_narrative, DiceRollEntry};

impl ProcessAction {
    pub(super) async fn combat_turn(
        &self,
        session: &mut GameSession,
        character: CharacterState,
        action: &str,
    ) -> Result<TurnOutcome, ActionError> {
        let state = session.combat().next_round();
        let hp_before = character.hp();

        let CombatRoundOutcome {
            result,
            mut character,
            enemies,
        } = {
            let mut rng = |min, max| self.random.gen_range(min, max);
            combat::resolve_combat_round(character, &state, session.enemies().to_vec(), &mut rng)
        };

        tracing::info!(
            session_id = %session.id(),
            round = result.round,
            attacks = result.attacks.len(),
            player_hp = result.player_hp,
            enemies_remaining = result.enemies_remaining,
            combat_ended = result.combat_ended,
            "Combat round resolved"
        );

        let prompt = combat_outcome_prompt(action, &result, &character, &enemies);
        let context = build_context(&character, session, self.history_limit);
        let reply = self
            .narrate(session.id(), &combat_system_prompt(), context, &prompt)
            .await?;

        let mut narrative = parse_narrative(&reply.text);
        if narrative.is_empty() {
            let lines: Vec<String> = result.attacks.iter().map(|a| a.describe()).collect();
            narrative = lines.join("\n");
        }

        let xp_gained = i32::try_from(result.xp_gained).unwrap_or(i32::MAX);
        let xp_delta = character.apply_xp_delta(xp_gained);

        if result.combat_ended {
            session.end_combat();
        } else {
            session.continue_combat(state, enemies);
        }

        let dice_rolls = result
            .attacks
            .iter()
            .flat_map(DiceRollEntry::from_attack)
            .collect();

        Ok(TurnOutcome {
            state_changes: StateChanges {
                hp_delta: character.hp() - hp_before,
                xp_delta,
                ..Default::default()
            },
            character,
            narrative,
            dice_rolls,
            transactions: Vec::new(),
            combat_round: Some(result),
        })
    }
}
