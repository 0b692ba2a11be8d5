#[cfg(test)]
mod tests {
    use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase};
    use crate::battle::tests::common::{
        engine_with_service, offline_engine, sure_hit, TestCombatantBuilder,
    };
    use crate::errors::BattleError;
    use crate::services::testing::FixedDamageService;
    use pretty_assertions::assert_eq;
    use schema::PokemonType;
    use std::sync::Arc;

    fn damage_dealt(events: &[BattleEvent]) -> Vec<(String, u32)> {
        events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::DamageDealt { attacker, damage, .. } => Some((attacker.clone(), *damage)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn knockout_goes_straight_to_victory() {
        let attacker = TestCombatantBuilder::new("charmander")
            .with_skills(vec![sure_hit(999)])
            .build();
        let boss = TestCombatantBuilder::new("snorlax").with_max_hp(10).build();
        // accuracy, no crit, damage factor
        let mut engine = offline_engine(vec![attacker], boss, vec![0.0, 0.9, 0.5]);

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();
        assert!(engine.selection_complete());

        let bus = engine.resolve_attacks().await.unwrap();

        assert_eq!(engine.phase(), BattlePhase::Victory);
        assert_eq!(engine.state().result, Some(BattleOutcome::Win));
        assert_eq!(engine.state().defender.current_hp(), 0);
        assert!(!bus.events().iter().any(|e| matches!(e, BattleEvent::CounterAttack { .. })));
        assert!(bus.events().contains(&BattleEvent::BattleEnded { outcome: BattleOutcome::Win }));

        // The counter phase never runs after a knockout.
        assert!(matches!(engine.counter_attack().await, Err(BattleError::WrongPhase(_))));
    }

    #[tokio::test]
    async fn expired_timer_with_no_selections_deals_no_damage() {
        let attackers = vec![
            TestCombatantBuilder::new("charmander").build(),
            TestCombatantBuilder::new("squirtle").build(),
        ];
        let boss = TestCombatantBuilder::new("snorlax").build();
        let mut engine = offline_engine(attackers, boss, vec![]);

        engine.finish_intro().unwrap();
        assert!(!engine.selection_complete());

        let expired = engine.expire_selection().unwrap();
        let forfeits = expired
            .events()
            .iter()
            .filter(|e| matches!(e, BattleEvent::SelectionForfeited { .. }))
            .count();
        assert_eq!(forfeits, 2);
        assert!(engine.selection_complete());

        let bus = engine.resolve_attacks().await.unwrap();

        assert_eq!(engine.phase(), BattlePhase::Counter);
        assert_eq!(engine.state().defender.current_hp(), 3000);
        assert!(damage_dealt(bus.events()).is_empty());
    }

    #[tokio::test]
    async fn damage_is_summed_in_seat_order_and_applied_once() {
        let attackers = vec![
            TestCombatantBuilder::new("charmander").build().with_name("Ash"),
            TestCombatantBuilder::new("squirtle").build().with_name("Brock"),
            TestCombatantBuilder::new("charmander").build().with_name("Misty"),
        ];
        let boss = TestCombatantBuilder::new("snorlax").build();
        let service = Arc::new(FixedDamageService::new(7, 1.0));
        let mut engine = engine_with_service(
            attackers,
            boss,
            vec![0.0, 0.9, 0.0, 0.9, 0.0, 0.9],
            service.clone(),
        );

        engine.finish_intro().unwrap();
        // Selections arrive out of seat order.
        engine.submit_selection(2, 1).unwrap();
        engine.submit_selection(0, 0).unwrap();
        engine.submit_selection(1, 3).unwrap();
        assert!(engine.selection_complete());

        let bus = engine.resolve_attacks().await.unwrap();

        assert_eq!(
            damage_dealt(bus.events()),
            vec![
                ("Ash".to_string(), 7),
                ("Brock".to_string(), 7),
                ("Misty".to_string(), 7)
            ]
        );
        let totals: Vec<_> = bus
            .events()
            .iter()
            .filter(|e| matches!(e, BattleEvent::TotalDamageApplied { .. }))
            .collect();
        assert_eq!(
            totals,
            vec![&BattleEvent::TotalDamageApplied {
                target: "Snorlax (Boss)".to_string(),
                total: 21,
                remaining_hp: 2979,
            }]
        );
        assert_eq!(engine.state().defender.current_hp(), 2979);
        assert_eq!(service.requests().len(), 3);
        assert_eq!(engine.phase(), BattlePhase::Counter);
    }

    #[tokio::test]
    async fn unreachable_damage_service_falls_back_to_local_formula() {
        let attacker = TestCombatantBuilder::new("charmander").with_moves(&["scratch"]).build();
        let defender = TestCombatantBuilder::new("charmander").build();
        // accuracy, no crit, top of the damage spread
        let mut engine = offline_engine(vec![attacker], defender, vec![0.0, 0.9, 1.0]);

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();
        let bus = engine.resolve_attacks().await.unwrap();

        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::DamageEstimatedLocally { .. })));
        // Unknown effectiveness, so no effectiveness line.
        assert!(!bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::AttackTypeEffectiveness { .. })));
        assert_eq!(damage_dealt(bus.events()), vec![("Charmander".to_string(), 5)]);
        assert_eq!(engine.state().defender.current_hp(), 34);
    }

    #[tokio::test]
    async fn remote_damage_carries_effectiveness_and_critical_flag() {
        let attacker = TestCombatantBuilder::new("squirtle").with_moves(&["water-gun"]).build();
        let boss = TestCombatantBuilder::new("snorlax").with_type(PokemonType::Fire).build();
        let service = Arc::new(FixedDamageService::new(12, 2.0));
        // accuracy, critical
        let mut engine = engine_with_service(vec![attacker], boss, vec![0.0, 0.01], service.clone());

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();
        let bus = engine.resolve_attacks().await.unwrap();

        let request = &service.requests()[0];
        assert_eq!(request.attacker_level, 5);
        assert_eq!(request.attacker_attack, 48);
        assert_eq!(request.defender_defense, 65);
        assert_eq!(request.skill_power, 40);
        assert_eq!(request.skill_type, PokemonType::Water);
        assert_eq!(request.defender_type, PokemonType::Fire);
        assert!(request.is_critical);

        let lines = bus.formatted_lines();
        assert!(lines.contains(&"A critical hit!".to_string()));
        assert!(lines.contains(&"It's super effective!".to_string()));
        assert_eq!(engine.state().defender.current_hp(), 2988);
    }

    #[tokio::test]
    async fn missed_move_deals_nothing_and_skips_damage() {
        let attacker = TestCombatantBuilder::new("charmander").with_moves(&["fire-blast"]).build();
        let boss = TestCombatantBuilder::new("snorlax").build();
        // 0.9 * 100 is not below 85
        let mut engine = offline_engine(vec![attacker], boss, vec![0.9]);

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();
        let bus = engine.resolve_attacks().await.unwrap();

        assert!(bus.events().contains(&BattleEvent::MoveMissed {
            attacker: "Charmander".to_string(),
            move_name: "Fire Blast".to_string(),
        }));
        assert!(damage_dealt(bus.events()).is_empty());
        assert_eq!(engine.state().defender.current_hp(), 3000);
    }

    #[tokio::test]
    async fn utility_move_consumes_no_rolls() {
        let attacker = TestCombatantBuilder::new("charmander").with_moves(&["rest"]).build();
        let boss = TestCombatantBuilder::new("snorlax").build();
        let mut engine = offline_engine(vec![attacker], boss, vec![]);

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();
        let bus = engine.resolve_attacks().await.unwrap();

        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::MoveHadNoDamage { .. })));
        assert_eq!(engine.state().defender.current_hp(), 3000);
        assert_eq!(engine.phase(), BattlePhase::Counter);
    }

    #[tokio::test]
    async fn resolution_waits_for_the_phase_to_end() {
        let attackers = vec![
            TestCombatantBuilder::new("charmander").build(),
            TestCombatantBuilder::new("squirtle").build(),
        ];
        let boss = TestCombatantBuilder::new("snorlax").build();
        let mut engine = offline_engine(attackers, boss, vec![]);

        engine.finish_intro().unwrap();
        engine.submit_selection(0, 0).unwrap();

        assert!(!engine.selection_complete());
        assert!(matches!(engine.resolve_attacks().await, Err(BattleError::WrongPhase(_))));
        assert_eq!(engine.phase(), BattlePhase::Selection);
    }
}
