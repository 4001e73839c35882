use std::sync::Arc;

use rand::RngCore;

use crate::core::{Cell, Grid, Purchase, Schedule, TowerId};

use super::GameConfig;

/// A purchase schedule (the genotype) together with its simulation state.
///
/// The genotype never changes once the candidate exists; the working schedule
/// is consumed as purchases execute and is restored by [`Candidate::refresh`],
/// so the same genotype can be scored again.
#[derive(Debug, Clone)]
pub struct Candidate {
    config: Arc<GameConfig>,
    genotype: Schedule,
    pending: Schedule,
    time: u64,
    opponent_hp: Grid,
    damage: Grid,
    occupancy: Vec<Option<TowerId>>,
    gold: f64,
    base_hp: f64,
    executed: Vec<Purchase>,
    deferred: Vec<Purchase>,
    fitness: Option<u64>,
}

impl Candidate {
    /// Every purchase in `genotype` must pass [`GameConfig::check_purchase`];
    /// schedules from outside the solver go through
    /// [`GameConfig::validate_schedule`] first.
    #[must_use]
    pub fn new(config: Arc<GameConfig>, genotype: Schedule) -> Self {
        let (height, width) = (config.height(), config.width());
        Self {
            pending: genotype.clone(),
            genotype,
            time: 0,
            opponent_hp: Grid::zeros(height, width),
            damage: Grid::zeros(height, width),
            occupancy: vec![None; height * width],
            gold: config.initial_gold(),
            base_hp: config.initial_hp(),
            executed: Vec::new(),
            deferred: Vec::new(),
            fitness: None,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    /// The immutable schedule this candidate was created from.
    #[must_use]
    pub fn genotype(&self) -> &Schedule {
        &self.genotype
    }

    /// Purchases not yet executed, including postponed ones.
    #[must_use]
    pub fn pending(&self) -> &Schedule {
        &self.pending
    }

    /// Number of completed simulation steps.
    #[must_use]
    pub fn time(&self) -> u64 {
        self.time
    }

    #[must_use]
    pub fn opponent_hp(&self) -> &Grid {
        &self.opponent_hp
    }

    /// Damage dealt per step on every cell by the currently active towers.
    #[must_use]
    pub fn damage_map(&self) -> &Grid {
        &self.damage
    }

    #[must_use]
    pub fn gold(&self) -> f64 {
        self.gold
    }

    #[must_use]
    pub fn base_hp(&self) -> f64 {
        self.base_hp
    }

    /// Executed purchases, each carrying the time it actually executed.
    #[must_use]
    pub fn executed(&self) -> &[Purchase] {
        &self.executed
    }

    /// One entry per postponement, as the purchase stood before being pushed back.
    #[must_use]
    pub fn deferred(&self) -> &[Purchase] {
        &self.deferred
    }

    /// Survival time measured by the last [`Candidate::run_to_death`].
    #[must_use]
    pub fn fitness(&self) -> Option<u64> {
        self.fitness
    }

    #[must_use]
    pub fn tower_at(&self, cell: Cell) -> Option<TowerId> {
        self.config
            .contains(cell)
            .then(|| self.occupancy[self.config.cell_index(cell)])
            .flatten()
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.base_hp <= 0.0
    }

    /// Resets the simulation to time zero with the genotype as working schedule.
    ///
    /// The last measured fitness is kept; it belongs to the genotype.
    pub fn refresh(&mut self) {
        self.pending = self.genotype.clone();
        self.time = 0;
        self.opponent_hp.fill(0.0);
        self.damage.fill(0.0);
        self.occupancy.fill(None);
        self.gold = self.config.initial_gold();
        self.base_hp = self.config.initial_hp();
        self.executed.clear();
        self.deferred.clear();
    }

    /// Advances the simulation by one step.
    pub fn step<R>(&mut self, rng: &mut R)
    where
        R: RngCore,
    {
        let mut dealt = 0.0;
        for (hp, damage) in self.opponent_hp.values_mut().zip(self.damage.values()) {
            let remaining = (*hp - damage).max(0.0);
            dealt += *hp - remaining;
            *hp = remaining;
        }
        self.gold += self.config.gold_per_damage() * dealt;

        self.base_hp -= self.opponent_hp[self.config.base_cell()];

        self.execute_due_purchases();

        for &(to, from) in self.config.moves() {
            self.opponent_hp[to] = self.opponent_hp[from];
        }
        let entry = self.config.entry_cell();
        self.opponent_hp[entry] = self.config.spawn_at(self.time, rng);

        self.time += 1;
    }

    /// Steps until the base falls, or until `step_limit` steps have completed.
    ///
    /// Records and returns the survival time.
    pub fn run_to_death<R>(&mut self, step_limit: Option<u64>, rng: &mut R) -> u64
    where
        R: RngCore,
    {
        while !self.is_dead() && step_limit.is_none_or(|limit| self.time < limit) {
            self.step(rng);
        }
        self.fitness = Some(self.time);
        self.time
    }

    /// Continues from `donor`'s current progress with a new set of pending purchases.
    ///
    /// The genotype becomes the donor's executed purchases followed by `pending`,
    /// so a later replay reproduces this second life from time zero.
    pub fn reincarnate_from(&mut self, donor: &Candidate, pending: Schedule) {
        debug_assert!(Arc::ptr_eq(&self.config, &donor.config));
        let mut genotype = Schedule::from(donor.executed.clone());
        genotype.extend(pending.iter().copied());

        self.genotype = genotype;
        self.pending = pending;
        self.time = donor.time;
        self.opponent_hp.clone_from(&donor.opponent_hp);
        self.damage.clone_from(&donor.damage);
        self.occupancy.clone_from(&donor.occupancy);
        self.gold = donor.gold;
        self.base_hp = donor.base_hp;
        self.executed.clone_from(&donor.executed);
        self.deferred.clone_from(&donor.deferred);
        self.fitness = None;
    }

    fn execute_due_purchases(&mut self) {
        let due = self.pending.take_due(self.time);
        let mut postponed = Vec::new();
        for mut purchase in due {
            let checked = self.config.check_purchase(&purchase);
            debug_assert!(checked.is_ok(), "unbuildable purchase: {checked:?}");
            let (Ok(()), Some(tower)) = (checked, self.config.tower(purchase.tower)) else {
                continue;
            };
            let cost = tower.cost();
            if cost <= self.gold {
                self.gold -= cost;
                self.place_tower(purchase.cell, purchase.tower);
                self.executed.push(purchase);
            } else {
                self.deferred.push(purchase);
                purchase.time = self.time + 1;
                postponed.push(purchase);
            }
        }
        self.pending.requeue_front(postponed);
    }

    fn place_tower(&mut self, cell: Cell, id: TowerId) {
        let idx = self.config.cell_index(cell);
        if let Some(previous) = self.occupancy[idx].and_then(|prev| self.config.tower(prev)) {
            let rebuy = self.config.rebuy();
            self.damage
                .add_kernel(previous.kernel(), cell, -rebuy.patch_removal);
            self.gold += rebuy.refund * previous.cost();
        }
        if let Some(tower) = self.config.tower(id) {
            self.damage.add_kernel(tower.kernel(), cell, 1.0);
        }
        self.occupancy[idx] = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use crate::{GameConfigBuilder, RebuyPolicy, SpawnCurve, TowerType};

    use super::*;

    /// Two-row map with the path along row 0, entry at column 0.
    fn corridor(len: usize) -> GameConfigBuilder {
        GameConfig::builder(len, 2).path((0..len).map(|col| Cell::new(0, col)))
    }

    fn rng() -> Pcg64 {
        Pcg64::seed_from_u64(0xBA5E)
    }

    #[test]
    fn test_no_affordable_tower_dies_at_closed_form_time() {
        // Constant waves of `c` reach the base after `len` steps, so the base
        // falls at the end of step `len - 1 + ceil(hp / c)`.
        let (len, c, hp) = (5_u64, 10.0, 25.0);
        let config = corridor(5)
            .tower(0, TowerType::filled(3, 100.0, 1000.0))
            .spawn(SpawnCurve::Constant { value: c })
            .initial_hp(hp)
            .initial_gold(50.0)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![Purchase::new(0, Cell::new(1, 2), 0)]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);

        let survived = candidate.run_to_death(None, &mut rng());
        assert_eq!(survived, len + 3);
        assert_eq!(candidate.fitness(), Some(len + 3));
        assert!(candidate.executed().is_empty());
        // Deferred once per step, never bought.
        assert_eq!(candidate.deferred().len(), 8);
        assert_eq!(candidate.gold(), 50.0);
    }

    #[test]
    fn test_closed_form_with_linear_spawn() {
        // Waves 0, 4, 8, ... arrive after 7 steps; cumulative damage first
        // reaches 100 with the wave of t = 7 (0 + 4 + ... + 28 = 112).
        let config = corridor(7)
            .tower(0, TowerType::filled(3, 5.0, 10_000.0))
            .spawn(SpawnCurve::Linear { rate: 4.0 })
            .initial_hp(100.0)
            .initial_gold(0.0)
            .build()
            .unwrap();
        let mut candidate = Candidate::new(Arc::new(config), Schedule::new());
        assert_eq!(candidate.run_to_death(None, &mut rng()), 7 + 7 + 1);
    }

    #[test]
    fn test_strong_tower_survives_indefinitely() {
        let config = corridor(7)
            .tower(0, TowerType::filled(3, 20.0, 50.0))
            .spawn(SpawnCurve::Constant { value: 10.0 })
            .initial_hp(100.0)
            .initial_gold(100.0)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![Purchase::new(0, Cell::new(1, 3), 0)]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);

        let survived = candidate.run_to_death(Some(2_000), &mut rng());
        assert_eq!(survived, 2_000);
        assert_eq!(candidate.base_hp(), 100.0);
        // Every wave dies before reaching the base and is converted to gold.
        assert!(candidate.gold() > 100.0);
        assert_eq!(candidate.executed().len(), 1);
    }

    #[test]
    fn test_gold_conversion_factor() {
        let config = corridor(5)
            .tower(0, TowerType::filled(3, 3.0, 10.0))
            .spawn(SpawnCurve::Constant { value: 1.0 })
            .initial_hp(100.0)
            .initial_gold(10.0)
            .gold_per_damage(2.5)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![Purchase::new(0, Cell::new(1, 1), 0)]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);
        let mut rng = rng();

        candidate.step(&mut rng);
        assert_eq!(candidate.gold(), 0.0);
        // Step 1: the wave of 1 hp on the entry cell is destroyed.
        candidate.step(&mut rng);
        assert_eq!(candidate.gold(), 2.5);
    }

    #[test]
    fn test_invariants_hold_every_step() {
        let config = corridor(9)
            .tower(0, TowerType::filled(3, 4.0, 30.0))
            .tower(1, TowerType::ring(5, 6.0, 60.0))
            .spawn(SpawnCurve::Linear { rate: 2.0 })
            .initial_hp(200.0)
            .initial_gold(40.0)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![
            Purchase::new(0, Cell::new(1, 2), 0),
            Purchase::new(1, Cell::new(1, 5), 1),
            Purchase::new(1, Cell::new(1, 7), 0),
            Purchase::new(6, Cell::new(1, 2), 1),
        ]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);
        let mut rng = rng();

        let mut previous_hp = candidate.base_hp();
        while !candidate.is_dead() && candidate.time() < 500 {
            candidate.step(&mut rng);
            assert!(candidate.pending().is_sorted());
            assert!(candidate.gold() >= 0.0);
            assert!(candidate.base_hp() <= previous_hp);
            previous_hp = candidate.base_hp();
        }
    }

    #[test]
    fn test_rebuy_replaces_previous_patch() {
        let config = Arc::new(
            corridor(5)
                .tower(0, TowerType::filled(3, 2.0, 10.0))
                .tower(1, TowerType::filled(1, 9.0, 10.0))
                .spawn(SpawnCurve::Constant { value: 0.0 })
                .initial_hp(10.0)
                .initial_gold(20.0)
                .build()
                .unwrap(),
        );
        let cell = Cell::new(1, 2);
        let schedule = Schedule::from(vec![Purchase::new(0, cell, 0), Purchase::new(2, cell, 1)]);
        let mut candidate = Candidate::new(Arc::clone(&config), schedule);
        let mut rng = rng();

        for _ in 0..3 {
            candidate.step(&mut rng);
        }
        let expected = config.tower(1).unwrap().damage_patch(cell, 2, 5);
        assert_eq!(candidate.damage_map(), &expected);
        assert_eq!(candidate.tower_at(cell), Some(1));
        assert_eq!(candidate.gold(), 0.0);
    }

    #[test]
    fn test_rebuy_policy_partial_removal_and_refund() {
        let config = corridor(5)
            .tower(0, TowerType::filled(1, 4.0, 10.0))
            .spawn(SpawnCurve::Constant { value: 0.0 })
            .initial_hp(10.0)
            .initial_gold(20.0)
            .rebuy_policy(RebuyPolicy {
                patch_removal: 0.5,
                refund: 0.5,
            })
            .build()
            .unwrap();
        let cell = Cell::new(1, 4);
        let schedule = Schedule::from(vec![Purchase::new(0, cell, 0), Purchase::new(1, cell, 0)]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);
        let mut rng = rng();
        candidate.step(&mut rng);
        candidate.step(&mut rng);

        assert_eq!(candidate.damage_map()[cell], 6.0);
        assert_eq!(candidate.gold(), 5.0);
    }

    #[test]
    fn test_postponed_purchase_keeps_priority() {
        let config = corridor(4)
            .tower(0, TowerType::filled(1, 1.0, 5.0))
            .tower(1, TowerType::filled(1, 1.0, 1.0))
            .spawn(SpawnCurve::Constant { value: 0.0 })
            .initial_hp(10.0)
            .initial_gold(3.0)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![
            Purchase::new(0, Cell::new(1, 0), 0),
            Purchase::new(0, Cell::new(1, 1), 1),
            Purchase::new(1, Cell::new(1, 2), 1),
        ]);
        let mut candidate = Candidate::new(Arc::new(config), schedule);
        let mut rng = rng();

        candidate.step(&mut rng);
        // The expensive purchase is postponed but the cheap one behind it runs.
        assert_eq!(candidate.executed().len(), 1);
        assert_eq!(candidate.pending().as_slice()[0].cell, Cell::new(1, 0));
        assert_eq!(candidate.pending().as_slice()[0].time, 1);
        assert_eq!(candidate.deferred().len(), 1);
        assert_eq!(candidate.deferred()[0].time, 0);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let config = corridor(6)
            .tower(0, TowerType::filled(3, 2.0, 10.0))
            .spawn(SpawnCurve::Linear { rate: 3.0 })
            .initial_hp(50.0)
            .initial_gold(10.0)
            .build()
            .unwrap();
        let schedule = Schedule::from(vec![
            Purchase::new(1, Cell::new(1, 1), 0),
            Purchase::new(4, Cell::new(1, 4), 0),
        ]);
        let mut candidate = Candidate::new(Arc::new(config), schedule.clone());
        let mut rng = rng();
        let first = candidate.run_to_death(None, &mut rng);

        candidate.refresh();
        let once = candidate.clone();
        candidate.refresh();

        for c in [&once, &candidate] {
            assert_eq!(c.pending(), &schedule);
            assert_eq!(c.genotype(), &schedule);
            assert_eq!(c.time(), 0);
            assert_eq!(c.gold(), 10.0);
            assert_eq!(c.base_hp(), 50.0);
            assert!(c.damage_map().values().all(|v| v == 0.0));
            assert!(c.opponent_hp().values().all(|v| v == 0.0));
            assert!(c.executed().is_empty());
            assert!(c.deferred().is_empty());
        }

        // Deterministic spawn: replay gives the same survival time.
        assert_eq!(candidate.run_to_death(None, &mut rng), first);
    }

    #[test]
    fn test_stochastic_replay_with_same_seed() {
        let config = Arc::new(
            corridor(8)
                .tower(0, TowerType::filled(3, 6.0, 40.0))
                .spawn(SpawnCurve::NoisyLinear {
                    rate: 3.0,
                    base_std_dev: 5.0,
                    std_dev_rate: 0.1,
                })
                .initial_hp(150.0)
                .initial_gold(80.0)
                .build()
                .unwrap(),
        );
        let schedule = Schedule::from(vec![
            Purchase::new(0, Cell::new(1, 3), 0),
            Purchase::new(3, Cell::new(1, 6), 0),
        ]);
        let mut candidate = Candidate::new(config, schedule);

        let first = candidate.run_to_death(Some(10_000), &mut Pcg64::seed_from_u64(99));
        candidate.refresh();
        let second = candidate.run_to_death(Some(10_000), &mut Pcg64::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn test_reincarnation_copies_progress() {
        let config = Arc::new(
            corridor(6)
                .tower(0, TowerType::filled(3, 2.0, 10.0))
                .spawn(SpawnCurve::Linear { rate: 1.0 })
                .initial_hp(500.0)
                .initial_gold(30.0)
                .build()
                .unwrap(),
        );
        let mut donor = Candidate::new(
            Arc::clone(&config),
            Schedule::from(vec![
                Purchase::new(0, Cell::new(1, 1), 0),
                Purchase::new(50, Cell::new(1, 4), 0),
            ]),
        );
        let mut rng = rng();
        for _ in 0..10 {
            donor.step(&mut rng);
        }

        let mut dead = Candidate::new(Arc::clone(&config), Schedule::new());
        let pending = Schedule::from(vec![Purchase::new(12, Cell::new(1, 5), 0)]);
        dead.reincarnate_from(&donor, pending.clone());

        assert_eq!(dead.time(), 10);
        assert_eq!(dead.gold(), donor.gold());
        assert_eq!(dead.base_hp(), donor.base_hp());
        assert_eq!(dead.damage_map(), donor.damage_map());
        assert_eq!(dead.pending(), &pending);
        assert_eq!(
            dead.genotype().as_slice(),
            &[
                Purchase::new(0, Cell::new(1, 1), 0),
                Purchase::new(12, Cell::new(1, 5), 0),
            ]
        );
        assert!(dead.genotype().is_sorted());
    }
}
