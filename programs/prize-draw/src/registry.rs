use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::instructions::{
    create_competition, submit_purchase, update_competition, PurchaseOutcome,
};
use crate::random::RandomSource;
use crate::result_log::ResultLog;
use crate::state::{
    Competition, CompetitionConfig, InstantWinRecord, Settings, StateDocument, WinnerRecord,
    STATE_DOCUMENT_VERSION,
};
use crate::store::Store;
use crate::utils::now_millis;

const DEFAULT_PAYMENT_REF: &str = "https://www.paypal.com/ncp/payment/DVSBN5YBYGPG6";

/// Event emitted when a competition is deleted
#[event]
pub struct CompetitionDeleted {
    pub competition_id: String,
    pub name: String,
    /// Tickets discarded with the competition's ticket log
    pub discarded_tickets: u64,
}

/// Event emitted when the winner history is wiped
#[event]
pub struct WinnerHistoryCleared {
    pub cleared_records: u64,
}

struct Slot {
    id: String,
    competition: Arc<Mutex<Competition>>,
}

/// Owns every competition and the result log.
///
/// All mutations go through the engine operations in [`crate::instructions`]
/// and run inside the store lock: the change is applied, the whole state is
/// saved, and if the save fails the change is undone before the error is
/// returned. A caller therefore never sees a mutation that was not persisted.
/// Reads take only the list and competition locks, so they never wait on a
/// save.
///
/// Lock order: store, competition list, one competition, result log.
pub struct CompetitionRegistry<R: RandomSource, S: Store> {
    settings: Settings,
    random: R,
    store: Mutex<S>,
    competitions: RwLock<Vec<Slot>>,
    results: Mutex<ResultLog>,
}

impl<R: RandomSource, S: Store> CompetitionRegistry<R, S> {
    /// Loads whatever `store` holds, or starts empty.
    pub fn open(settings: Settings, random: R, store: S) -> Result<Self> {
        settings.validate()?;
        let document = store.load()?.unwrap_or_default();

        msg!(
            "Registry opened with {} competitions and {} winners",
            document.competitions.len(),
            document.winners.len()
        );

        let slots = document
            .competitions
            .into_iter()
            .map(|competition| Slot {
                id: competition.id.clone(),
                competition: Arc::new(Mutex::new(competition)),
            })
            .collect();

        Ok(Self {
            settings,
            random,
            store: Mutex::new(store),
            competitions: RwLock::new(slots),
            results: Mutex::new(ResultLog::new(document.winners, document.instant_wins)),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn create(&self, config: &CompetitionConfig) -> Result<Competition> {
        self.create_at(config, now_millis())
    }

    pub fn create_at(&self, config: &CompetitionConfig, now: i64) -> Result<Competition> {
        let store = self.lock_store();
        let competition = self.insert(&mut self.write_list(), config, now)?;

        self.save_or_restore(&store, || {
            self.write_list().retain(|slot| slot.id != competition.id);
        })?;
        Ok(competition)
    }

    /// Replaces configuration fields only; round state is never touched.
    pub fn update(&self, id: &str, config: &CompetitionConfig) -> Result<Competition> {
        let store = self.lock_store();
        let handle = self.handle(id)?;
        let (previous, updated) = {
            let mut competition = handle.lock().unwrap_or_else(PoisonError::into_inner);
            let updated = update_competition(&competition, config, &self.settings)?;
            (std::mem::replace(&mut *competition, updated.clone()), updated)
        };

        self.save_or_restore(&store, || {
            *handle.lock().unwrap_or_else(PoisonError::into_inner) = previous;
        })?;
        Ok(updated)
    }

    /// Removes the competition and its ticket log. Results already logged stay.
    pub fn delete(&self, id: &str) -> Result<Competition> {
        let store = self.lock_store();
        let (index, slot) = {
            let mut competitions = self.write_list();
            let index = competitions
                .iter()
                .position(|slot| slot.id == id)
                .ok_or(CompetitionError::CompetitionNotFound)?;
            (index, competitions.remove(index))
        };
        let removed = slot
            .competition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        self.save_or_restore(&store, || self.write_list().insert(index, slot))?;

        msg!("Competition {} deleted", removed.id);
        emit!(CompetitionDeleted {
            competition_id: removed.id.clone(),
            name: removed.name.clone(),
            discarded_tickets: removed.ticket_log.len() as u64,
        });
        Ok(removed)
    }

    pub fn submit_purchase(&self, id: &str, buyer_name: &str) -> Result<PurchaseOutcome> {
        self.submit_purchase_at(id, buyer_name, now_millis())
    }

    /// Records one ticket for `buyer_name`, runs the instant-win lottery and,
    /// once the threshold is reached, the main draw. Either everything is
    /// committed and saved, or nothing is.
    pub fn submit_purchase_at(
        &self,
        id: &str,
        buyer_name: &str,
        now: i64,
    ) -> Result<PurchaseOutcome> {
        let store = self.lock_store();
        let handle = self.handle(id)?;
        let (previous, mark, outcome) = {
            let mut competition = handle.lock().unwrap_or_else(PoisonError::into_inner);
            let outcome =
                submit_purchase(&competition, buyer_name, now, &self.settings, &self.random)?;
            let previous = std::mem::replace(&mut *competition, outcome.competition.clone());

            let mut results = self.lock_results();
            let mark = results.mark();
            if let Some(instant_win) = &outcome.instant_win {
                results.append_instant_win(instant_win.clone());
            }
            if let Some(winner) = &outcome.winner {
                results.append_winner(winner.clone());
            }
            (previous, mark, outcome)
        };

        self.save_or_restore(&store, || {
            *handle.lock().unwrap_or_else(PoisonError::into_inner) = previous;
            self.lock_results().truncate(mark);
        })?;
        Ok(outcome)
    }

    pub fn get(&self, id: &str) -> Result<Competition> {
        let handle = self.handle(id)?;
        let competition = handle.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(competition)
    }

    pub fn len(&self) -> usize {
        self.read_list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Competitions in insertion order whose category equals `category` (all
    /// when `None`) and whose name contains `name`, ignoring case (all when
    /// `None` or blank). Evaluated lazily; clone or [`FilteredCompetitions::restart`]
    /// to iterate again.
    pub fn list_filtered(
        &self,
        category: Option<&str>,
        name: Option<&str>,
    ) -> FilteredCompetitions {
        let slots = self
            .read_list()
            .iter()
            .map(|slot| Arc::clone(&slot.competition))
            .collect();

        FilteredCompetitions {
            slots,
            position: 0,
            category: category.map(str::to_string),
            name: name
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty()),
        }
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for competition in self.list_filtered(None, None) {
            if !categories.contains(&competition.category) {
                categories.push(competition.category);
            }
        }
        categories
    }

    pub fn winner_history(&self) -> Vec<WinnerRecord> {
        self.lock_results().winners().to_vec()
    }

    pub fn instant_win_history(&self) -> Vec<InstantWinRecord> {
        self.lock_results().instant_wins().to_vec()
    }

    pub fn export_csv(&self) -> Result<String> {
        self.lock_results().export_csv()
    }

    pub fn clear_winner_history(&self) -> Result<()> {
        let store = self.lock_store();
        let previous = {
            let mut results = self.lock_results();
            let previous = results.clone();
            results.clear_winners();
            previous
        };
        let cleared_records = previous.winners().len() as u64;

        self.save_or_restore(&store, || *self.lock_results() = previous)?;

        emit!(WinnerHistoryCleared { cleared_records });
        Ok(())
    }

    /// Seeds the stock competitions when the registry holds none. Returns how
    /// many were created. The emptiness check and the inserts happen under one
    /// write lock, so concurrent callers seed at most once.
    pub fn seed_defaults_if_empty(&self) -> Result<usize> {
        let store = self.lock_store();
        let created = {
            let mut competitions = self.write_list();
            if !competitions.is_empty() {
                return Ok(0);
            }

            let now = now_millis();
            for config in default_competitions() {
                let config = config.external_payment_ref(DEFAULT_PAYMENT_REF);
                if let Err(e) = self.insert(&mut competitions, &config, now) {
                    competitions.clear();
                    return Err(e);
                }
            }
            competitions.len()
        };

        self.save_or_restore(&store, || self.write_list().clear())?;
        msg!("Seeded {} stock competitions", created);
        Ok(created)
    }

    /// Drops every competition and both logs.
    pub fn reset(&self) -> Result<()> {
        let store = self.lock_store();
        let (competitions, results) = {
            let mut competitions = self.write_list();
            let mut results = self.lock_results();
            (
                std::mem::take(&mut *competitions),
                std::mem::take(&mut *results),
            )
        };

        self.save_or_restore(&store, || {
            *self.write_list() = competitions;
            *self.lock_results() = results;
        })?;

        msg!("Registry reset");
        Ok(())
    }

    /// The document the store would receive right now.
    pub fn snapshot(&self) -> StateDocument {
        let competitions = self
            .read_list()
            .iter()
            .map(|slot| {
                slot.competition
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .collect();
        let results = self.lock_results();

        StateDocument {
            version: STATE_DOCUMENT_VERSION,
            competitions,
            winners: results.winners().to_vec(),
            instant_wins: results.instant_wins().to_vec(),
        }
    }

    /// Builds a competition under a fresh id and appends it to `competitions`.
    fn insert(
        &self,
        competitions: &mut Vec<Slot>,
        config: &CompetitionConfig,
        now: i64,
    ) -> Result<Competition> {
        let mut id = self.random.identifier();
        while competitions.iter().any(|slot| slot.id == id) {
            id = self.random.identifier();
        }

        let competition = create_competition(config, &self.settings, id, now)?;
        competitions.push(Slot {
            id: competition.id.clone(),
            competition: Arc::new(Mutex::new(competition.clone())),
        });
        Ok(competition)
    }

    /// Saves the current state; on failure runs `restore` to undo the change
    /// that was just applied and returns the store's error.
    ///
    /// Callers hold the store lock but no list, competition or result guard.
    fn save_or_restore(&self, store: &S, restore: impl FnOnce()) -> Result<()> {
        if let Err(e) = store.save(&self.snapshot()) {
            msg!("Saving state failed, change rolled back");
            restore();
            return Err(e);
        }
        Ok(())
    }

    /// The competition behind `id`. Only mutate it while holding the store
    /// lock, which also keeps it from being deleted underneath.
    fn handle(&self, id: &str) -> Result<Arc<Mutex<Competition>>> {
        let competitions = self.read_list();
        let slot = find_slot(&competitions, id)?;
        Ok(Arc::clone(&slot.competition))
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_list(&self) -> RwLockReadGuard<'_, Vec<Slot>> {
        self.competitions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_list(&self) -> RwLockWriteGuard<'_, Vec<Slot>> {
        self.competitions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_results(&self) -> MutexGuard<'_, ResultLog> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn default_competitions() -> [CompetitionConfig; 3] {
    [
        CompetitionConfig::new("£500 Cash", 100)
            .category("Cash")
            .image_ref("500cash.png")
            .ticket_limit(2_000)
            .draw_threshold(100_000)
            .instant_prizes(["Free Ticket", "£10 Cash", "Mystery Prize"]),
        CompetitionConfig::new("£300 Cash", 50)
            .category("Cash")
            .image_ref("300cash.png")
            .ticket_limit(2_000)
            .draw_threshold(100_000)
            .instant_prizes(["Free Ticket"]),
        CompetitionConfig::new("2 Night City Break for 2", 300)
            .category("Travel")
            .image_ref("citybreak.png")
            .ticket_limit(1_000)
            .draw_threshold(100_000),
    ]
}

fn find_slot<'a>(competitions: &'a [Slot], id: &str) -> Result<&'a Slot> {
    competitions
        .iter()
        .find(|slot| slot.id == id)
        .ok_or_else(|| CompetitionError::CompetitionNotFound.into())
}

/// Lazy, restartable view produced by [`CompetitionRegistry::list_filtered`].
///
/// Membership is fixed when the view is created; each competition's state is
/// read when the iterator reaches it.
#[derive(Clone)]
pub struct FilteredCompetitions {
    slots: Vec<Arc<Mutex<Competition>>>,
    position: usize,
    category: Option<String>,
    name: Option<String>,
}

impl FilteredCompetitions {
    pub fn restart(&mut self) {
        self.position = 0;
    }

    fn matches(&self, competition: &Competition) -> bool {
        let category_matches = self
            .category
            .as_deref()
            .map_or(true, |category| competition.category == category);
        let name_matches = self
            .name
            .as_deref()
            .map_or(true, |name| competition.name.to_lowercase().contains(name));
        category_matches && name_matches
    }
}

impl Iterator for FilteredCompetitions {
    type Item = Competition;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.get(self.position) {
            self.position += 1;
            let competition = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
            if self.matches(&competition) {
                return Some(competition);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use anchor_lang::error::Error;

    use super::*;
    use crate::random::SeededRandom;
    use crate::store::MemoryStore;

    /// Saves through to memory until `failing` is switched on.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Arc<AtomicBool>,
    }

    impl Store for FlakyStore {
        fn load(&self) -> Result<Option<StateDocument>> {
            self.inner.load()
        }

        fn save(&self, document: &StateDocument) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CompetitionError::StorageFailed.into());
            }
            self.inner.save(document)
        }
    }

    fn flaky_registry(
        settings: Settings,
    ) -> (CompetitionRegistry<SeededRandom, FlakyStore>, Arc<AtomicBool>) {
        let store = FlakyStore::default();
        let failing = Arc::clone(&store.failing);
        let registry = CompetitionRegistry::open(settings, SeededRandom::new(3), store).unwrap();
        (registry, failing)
    }

    fn registry() -> CompetitionRegistry<SeededRandom, MemoryStore> {
        CompetitionRegistry::open(
            Settings::default().with_instant_win_chance(0.0),
            SeededRandom::new(1),
            MemoryStore::new(),
        )
        .unwrap()
    }

    #[test]
    fn seeds_stock_competitions_once() {
        let registry = registry();
        assert_eq!(registry.seed_defaults_if_empty().unwrap(), 3);
        assert_eq!(registry.seed_defaults_if_empty().unwrap(), 0);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.categories(), vec!["Cash".to_string(), "Travel".to_string()]);
    }

    #[test]
    fn filters_by_category_and_name() {
        let registry = registry();
        registry.seed_defaults_if_empty().unwrap();

        let cash: Vec<_> = registry
            .list_filtered(Some("Cash"), None)
            .map(|competition| competition.name)
            .collect();
        assert_eq!(cash, vec!["£500 Cash", "£300 Cash"]);

        let city: Vec<_> = registry
            .list_filtered(None, Some("CITY"))
            .map(|competition| competition.name)
            .collect();
        assert_eq!(city, vec!["2 Night City Break for 2"]);

        assert_eq!(registry.list_filtered(Some("Travel"), Some("cash")).count(), 0);
        assert_eq!(registry.list_filtered(None, Some("  ")).count(), 3);
    }

    #[test]
    fn filtered_view_restarts() {
        let registry = registry();
        registry.seed_defaults_if_empty().unwrap();

        let mut view = registry.list_filtered(Some("Cash"), None);
        assert_eq!(view.by_ref().count(), 2);
        assert_eq!(view.next(), None);
        view.restart();
        assert_eq!(view.count(), 2);
    }

    #[test]
    fn reset_wipes_everything() {
        let registry = registry();
        registry.seed_defaults_if_empty().unwrap();
        registry.reset().unwrap();

        assert!(registry.is_empty());
        assert!(registry.winner_history().is_empty());
        assert!(registry.instant_win_history().is_empty());
        assert_eq!(registry.snapshot(), StateDocument::default());
    }

    #[test]
    fn concurrent_seeding_creates_defaults_once() {
        let registry = registry();
        let created: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| registry.seed_defaults_if_empty().unwrap()))
                .collect();
            workers.into_iter().map(|worker| worker.join().unwrap()).sum()
        });

        assert_eq!(created, 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn failed_save_undoes_purchase_draw_and_instant_win() {
        let (registry, failing) =
            flaky_registry(Settings::default().with_instant_win_chance(1.0));
        let competition = registry
            .create_at(
                &CompetitionConfig::new("Cash", 100)
                    .draw_threshold(100)
                    .instant_prizes(["Mug"]),
                0,
            )
            .unwrap();
        let before = registry.snapshot();

        failing.store(true, Ordering::SeqCst);
        let err = registry
            .submit_purchase_at(&competition.id, "Ann", 1)
            .unwrap_err();
        assert_eq!(err, Error::from(CompetitionError::StorageFailed));
        assert_eq!(registry.snapshot(), before);
        assert_eq!(registry.get(&competition.id).unwrap().round, 1);
        assert!(registry.winner_history().is_empty());
        assert!(registry.instant_win_history().is_empty());

        failing.store(false, Ordering::SeqCst);
        let outcome = registry
            .submit_purchase_at(&competition.id, "Ann", 2)
            .unwrap();
        assert_eq!(outcome.instant_win.unwrap().prize, "Mug");
        assert_eq!(outcome.winner.unwrap().winner_name, "Ann");
        assert_eq!(registry.get(&competition.id).unwrap().round, 2);
        assert_eq!(registry.winner_history().len(), 1);
    }

    #[test]
    fn failed_save_undoes_admin_changes() {
        let (registry, failing) = flaky_registry(Settings::default().with_instant_win_chance(0.0));
        let first = registry
            .create_at(&CompetitionConfig::new("First", 100).draw_threshold(100), 0)
            .unwrap();
        let second = registry
            .create_at(&CompetitionConfig::new("Second", 100), 0)
            .unwrap();
        registry.submit_purchase_at(&first.id, "Ann", 1).unwrap();
        let before = registry.snapshot();
        let storage_failed = Error::from(CompetitionError::StorageFailed);

        failing.store(true, Ordering::SeqCst);
        assert_eq!(
            registry
                .create_at(&CompetitionConfig::new("Third", 100), 2)
                .unwrap_err(),
            storage_failed
        );
        assert_eq!(
            registry
                .update(&first.id, &first.config().name("Renamed"))
                .unwrap_err(),
            storage_failed
        );
        assert_eq!(registry.delete(&first.id).unwrap_err(), storage_failed);
        assert_eq!(registry.clear_winner_history().unwrap_err(), storage_failed);
        assert_eq!(registry.reset().unwrap_err(), storage_failed);
        assert_eq!(registry.snapshot(), before);

        let ids: Vec<_> = registry
            .list_filtered(None, None)
            .map(|competition| competition.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(registry.winner_history().len(), 1);
    }

    #[test]
    fn failed_save_leaves_registry_unseeded() {
        let (registry, failing) = flaky_registry(Settings::default());
        failing.store(true, Ordering::SeqCst);

        assert!(registry.seed_defaults_if_empty().is_err());
        assert!(registry.is_empty());

        failing.store(false, Ordering::SeqCst);
        assert_eq!(registry.seed_defaults_if_empty().unwrap(), 3);
    }
}
