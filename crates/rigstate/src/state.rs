//! Application state shared across HTTP handlers

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rigstate_api::RescanResponse;
use rigstate_inventory::{Inventory, InventoryScanner, SystemStatus};
use tracing::{info, warn};

use crate::api::error::AppError;

/// Application state shared across all handlers
///
/// Every read or write of the inventory goes through the one lock, on the
/// blocking pool.
#[derive(Clone)]
pub struct AppState {
    inventory: Arc<Mutex<Inventory>>,
    scanner: InventoryScanner,
}

impl AppState {
    /// Create new application state with an empty inventory
    pub fn new(scanner: InventoryScanner) -> Self {
        Self {
            inventory: Arc::new(Mutex::new(Inventory::default())),
            scanner,
        }
    }

    /// Run `f` against the locked inventory on the blocking pool
    ///
    /// # Errors
    /// Returns `AppError` if the blocking task panics or is cancelled
    pub async fn with_inventory<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Inventory, &InventoryScanner) -> T + Send + 'static,
        T: Send + 'static,
    {
        let inventory = Arc::clone(&self.inventory);
        let scanner = self.scanner.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = inventory.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard, &scanner)
        })
        .await
        .map_err(|e| AppError::task_failed(format!("inventory task failed: {e}")))
    }

    /// Full scan, then swap the result in
    ///
    /// The scan itself runs without the lock so readers keep the previous
    /// inventory until it finishes. A failed scan leaves it in place.
    ///
    /// # Errors
    /// Returns `AppError` if the scan fails or the blocking task panics
    pub async fn rescan(&self) -> Result<RescanResponse, AppError> {
        let scanner = self.scanner.clone();
        let fresh = tokio::task::spawn_blocking(move || scanner.try_scan())
            .await
            .map_err(|e| AppError::task_failed(format!("scan task failed: {e}")))?
            .inspect_err(|e| warn!(error = %e, "rescan failed, keeping previous inventory"))?;

        let response = RescanResponse {
            collected_at: fresh.collected_at.unwrap_or_else(chrono::Utc::now),
            cpus: fresh.cpus.len(),
            gpus: fresh.gpus.len(),
            ram: fresh.ram.len(),
            drives: fresh.drives.len(),
            network: fresh.network.len(),
            motherboard: fresh.motherboard.is_some(),
        };

        self.with_inventory(move |inventory, _| *inventory = fresh).await?;
        info!(gpus = response.gpus, drives = response.drives, "inventory replaced");
        Ok(response)
    }

    /// Sample uptime, load, CPU temperature and memory
    ///
    /// Only the sensor lookup holds the lock; the load window does not.
    ///
    /// # Errors
    /// Returns `AppError` if a blocking task panics or is cancelled
    pub async fn system_status(&self) -> Result<SystemStatus, AppError> {
        let sensor = self
            .with_inventory(|inventory, _| inventory.cpu_sensor().map(Path::to_path_buf))
            .await?;
        let io = self.scanner.io().clone();

        tokio::task::spawn_blocking(move || SystemStatus::sample(&io, sensor.as_deref()))
            .await
            .map_err(|e| AppError::task_failed(format!("status task failed: {e}")))
    }

    /// Re-read every dynamic field
    ///
    /// # Errors
    /// Returns `AppError` if the blocking task panics or is cancelled
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.with_inventory(|inventory, scanner| inventory.refresh(scanner.io()))
            .await
    }
}
