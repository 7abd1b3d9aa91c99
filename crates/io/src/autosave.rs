// Debounced persistence.
//
// Every mutation schedules a write; only the latest scheduled snapshot within
// the debounce window actually hits the store. A generation counter decides
// staleness: each schedule bumps it, and a timer thread writes only if its
// generation is still current when it wakes.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use accession_engine::sheet::Sheet;

use crate::store::{ProjectStore, StoreError};

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;

pub struct Autosave {
    store: Arc<ProjectStore>,
    delay: Duration,
    generation: Arc<Mutex<u64>>,
}

impl Autosave {
    pub fn new(store: Arc<ProjectStore>) -> Self {
        Self::with_delay(store, Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS))
    }

    pub fn with_delay(store: Arc<ProjectStore>, delay: Duration) -> Self {
        Self { store, delay, generation: Arc::new(Mutex::new(0)) }
    }

    /// Schedule a write of this snapshot after the debounce delay. A later
    /// schedule, flush, or cancel supersedes it.
    pub fn schedule(&self, sheet: Sheet) {
        let my_generation = self.bump();
        let store = Arc::clone(&self.store);
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        thread::spawn(move || {
            thread::sleep(delay);
            // The lock is held across the staleness check and the write, so a
            // concurrent flush can never land between them and be overwritten.
            let generation = generation.lock().unwrap();
            if *generation != my_generation {
                return;
            }
            if let Err(e) = store.set_sheet(&sheet) {
                eprintln!("autosave failed: {}", e);
            }
        });
    }

    /// Write immediately, cancelling any pending debounced write.
    pub fn flush(&self, sheet: &Sheet) -> Result<(), StoreError> {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        self.store.set_sheet(sheet)
    }

    /// Drop any pending write without saving.
    pub fn cancel(&self) {
        self.bump();
    }

    fn bump(&self) -> u64 {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        *generation
    }
}
