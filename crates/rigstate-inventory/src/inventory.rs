//! Canonical inventory and the scan pipeline
//!
//! A scan runs in fixed stages: extract (tree to records), finalize (context
//! tables), enrich (static facts read from the host), GUID assignment, then a
//! first telemetry refresh. Only the last stage runs again on refresh.

use std::path::Path;

use chrono::{DateTime, Utc};
use rigstate_api::OverclockRequest;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::collab::Collaborators;
use crate::context::ScanContext;
use crate::control::{self, OverclockOutcome};
use crate::error::InventoryError;
use crate::extract::{cpu, drive, gpu, motherboard, network, ram};
use crate::guid::Guid;
use crate::merge::HardwareRecord;
use crate::quirks::QuirkTable;
use crate::snapshot::{DynamicEntry, DynamicSnapshot, StaticSnapshot};
use crate::system::{OsInfo, SystemStatus};
use crate::telemetry;
use crate::tree::DeviceNode;
use crate::types::{
    CpuParameters, DriveParameters, GpuParameters, MotherboardParameters, NetworkAdapter, RamCard,
};

/// Every hardware record of one host
#[derive(Debug, Clone, Default, Serialize)]
pub struct Inventory {
    pub cpus: Vec<CpuParameters>,
    pub gpus: Vec<GpuParameters>,
    pub ram: Vec<RamCard>,
    pub drives: Vec<DriveParameters>,
    pub network: Vec<NetworkAdapter>,
    pub motherboard: Option<MotherboardParameters>,
    pub os: OsInfo,
    pub collected_at: Option<DateTime<Utc>>,
}

impl Inventory {
    /// Run every extractor over the context's tree
    #[must_use]
    pub fn extract(ctx: &ScanContext) -> Self {
        Self {
            cpus: cpu::scan(ctx),
            gpus: gpu::scan(ctx),
            ram: ram::scan(ctx),
            drives: drive::scan(ctx),
            network: network::scan(ctx),
            motherboard: motherboard::scan(ctx),
            ..Self::default()
        }
    }

    /// Extract, finalize and identify without touching the host
    #[must_use]
    pub fn from_tree(ctx: &ScanContext) -> Self {
        let mut inventory = Self::extract(ctx);
        inventory.finalize(ctx);
        inventory.assign_guids();
        inventory
    }

    pub fn finalize(&mut self, ctx: &ScanContext) {
        cpu::finalize(&mut self.cpus, ctx);
        gpu::finalize(&mut self.gpus, ctx);
        ram::finalize(&mut self.ram, ctx);
        drive::finalize(&mut self.drives, ctx);
    }

    /// Static attributes only the live host can provide
    pub fn enrich(&mut self, ctx: &ScanContext, io: &Collaborators) {
        gpu::enrich(&mut self.gpus, ctx, io);
        if let Some(board) = self.motherboard.as_mut() {
            motherboard::enrich(board, io);
        }
        self.os = OsInfo::collect(io);
    }

    /// Give every record its GUID; records that already have one keep it
    pub fn assign_guids(&mut self) {
        self.cpus.iter_mut().for_each(HardwareRecord::assign_guid);
        self.gpus.iter_mut().for_each(HardwareRecord::assign_guid);
        self.ram.iter_mut().for_each(HardwareRecord::assign_guid);
        self.drives.iter_mut().for_each(HardwareRecord::assign_guid);
        self.network.iter_mut().for_each(HardwareRecord::assign_guid);
        if let Some(board) = self.motherboard.as_mut() {
            board.assign_guid();
        }
    }

    /// Re-read every dynamic field
    #[instrument(skip_all)]
    pub fn refresh(&mut self, io: &Collaborators) {
        for record in &mut self.cpus {
            telemetry::refresh_cpu(record, io);
        }
        for record in &mut self.gpus {
            telemetry::refresh_gpu(record, io);
        }
        for record in &mut self.drives {
            telemetry::refresh_drive(record, io);
        }
        for record in &mut self.network {
            telemetry::refresh_network(record, io);
        }
        debug!("telemetry refreshed");
    }

    /// Apply a control request to the record addressed by `guid`
    ///
    /// Records other than GPUs have no knobs; every field set in the request
    /// is rejected as unsupported.
    pub fn apply_overclock(
        &mut self,
        io: &Collaborators,
        guid: &Guid,
        request: &OverclockRequest,
    ) -> OverclockOutcome {
        if let Some(gpu) = self
            .gpus
            .iter_mut()
            .find(|g| g.guid.get() == Some(guid))
        {
            return control::apply_to_gpu(gpu, request, io);
        }
        if self.contains(guid) {
            return control::reject_all(request);
        }
        OverclockOutcome::NotFound
    }

    /// Whether any record has `guid`
    #[must_use]
    pub fn contains(&self, guid: &Guid) -> bool {
        let wanted = Some(guid);
        self.cpus.iter().any(|r| r.guid.get() == wanted)
            || self.gpus.iter().any(|r| r.guid.get() == wanted)
            || self.ram.iter().any(|r| r.guid.get() == wanted)
            || self.drives.iter().any(|r| r.guid.get() == wanted)
            || self.network.iter().any(|r| r.guid.get() == wanted)
            || self.motherboard.as_ref().is_some_and(|r| r.guid.get() == wanted)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty()
            && self.gpus.is_empty()
            && self.ram.is_empty()
            && self.drives.is_empty()
            && self.network.is_empty()
            && self.motherboard.is_none()
    }

    /// The temperature input of the first CPU that has one
    #[must_use]
    pub fn cpu_sensor(&self) -> Option<&Path> {
        self.cpus.iter().find_map(|c| c.temperature_input.as_deref())
    }

    #[must_use]
    pub fn system_status(&self, io: &Collaborators) -> SystemStatus {
        SystemStatus::sample(io, self.cpu_sensor())
    }

    #[must_use]
    pub fn static_snapshot(&self) -> StaticSnapshot {
        StaticSnapshot {
            collected_at: self.collected_at,
            os: self.os.clone(),
            cpus: self.cpus.clone(),
            gpus: self.gpus.clone(),
            ram: self.ram.clone(),
            drives: self.drives.clone(),
            network: self.network.clone(),
            motherboard: self.motherboard.clone(),
        }
    }

    #[must_use]
    pub fn dynamic_snapshot(&self) -> DynamicSnapshot {
        DynamicSnapshot {
            refreshed_at: Utc::now(),
            cpus: self.cpus.iter().map(|r| DynamicEntry::of(r, &r.sensors)).collect(),
            gpus: self.gpus.iter().map(|r| DynamicEntry::of(r, &r.sensors)).collect(),
            drives: self.drives.iter().map(|r| DynamicEntry::of(r, &r.sensors)).collect(),
            network: self.network.iter().map(|r| DynamicEntry::of(r, &r.sensors)).collect(),
        }
    }
}

/// Runs full scans against one set of collaborators
#[derive(Debug, Clone)]
pub struct InventoryScanner {
    io: Collaborators,
    quirks: QuirkTable,
}

impl InventoryScanner {
    #[must_use]
    pub fn new(io: Collaborators) -> Self {
        Self {
            io,
            quirks: QuirkTable::default(),
        }
    }

    #[must_use]
    pub fn with_quirks(mut self, quirks: QuirkTable) -> Self {
        self.quirks = quirks;
        self
    }

    #[must_use]
    pub fn io(&self) -> &Collaborators {
        &self.io
    }

    /// Full scan
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::PrivilegeFailure`] when not running as
    /// superuser, and the probe's error when `lshw` fails or prints something
    /// that is not a device tree.
    #[instrument(skip(self))]
    pub fn try_scan(&self) -> Result<Inventory, InventoryError> {
        if !self.io.is_superuser() {
            return Err(InventoryError::PrivilegeFailure(
                "hardware probe needs superuser rights".into(),
            ));
        }

        let json = self.io.try_run("lshw", &["-json"])?;
        let tree = DeviceNode::from_json(&json)?;
        let ctx = ScanContext::discover(tree, &self.io, self.quirks.clone());

        let mut inventory = Inventory::extract(&ctx);
        inventory.finalize(&ctx);
        inventory.enrich(&ctx, &self.io);
        inventory.assign_guids();
        inventory.refresh(&self.io);
        inventory.collected_at = Some(Utc::now());

        info!(
            cpus = inventory.cpus.len(),
            gpus = inventory.gpus.len(),
            ram = inventory.ram.len(),
            drives = inventory.drives.len(),
            network = inventory.network.len(),
            motherboard = inventory.motherboard.is_some(),
            "inventory collected"
        );
        Ok(inventory)
    }

    /// Full scan; any failure yields an empty inventory
    #[must_use]
    pub fn scan(&self) -> Inventory {
        match self.try_scan() {
            Ok(inventory) => inventory,
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "scan failed, reporting empty inventory");
                Inventory::default()
            }
        }
    }
}
