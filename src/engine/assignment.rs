//! Truck/driver assignment coordinator.
//!
//! Keeps the one-driver-per-truck pairing and the truck status in step, and
//! writes a history row for every change. Every entry point runs as one
//! transaction while holding the per-truck locks of the trucks it touches.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::db::{drivers, truck_history, trucks};
use crate::error::AppError;
use crate::models::driver::{Driver, DriverFields};
use crate::models::truck::{Truck, TruckFields, TruckStatus};
use crate::models::truck_history::{HistoryKind, NewHistoryEntry};
use crate::state::AppState;

const UNASSIGNED_NOTE: &str = "Unassigned driver";

/// How many times a driver-side operation re-reads the driver's truck after
/// finding it changed while waiting for the truck locks.
const LOCK_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub driver: Option<Driver>,
    pub truck: Truck,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverAssignment {
    pub driver: Option<Driver>,
    pub truck: Option<Truck>,
}

/// Puts `driver_id` on `truck_id`, or frees the truck when `driver_id` is
/// `None`. Fails with not-found, and changes nothing, when either id is
/// unknown.
pub async fn assign_driver(
    state: &AppState,
    truck_id: i64,
    driver_id: Option<i64>,
) -> Result<AssignmentOutcome, AppError> {
    let started = Instant::now();
    let kind = if driver_id.is_some() { "assign" } else { "unassign" };

    let result = assign_locked(state, truck_id, driver_id).await;

    state
        .metrics
        .observe_assignment(kind, result.is_ok(), started.elapsed());
    if let Err(err) = &result {
        warn!(truck_id, ?driver_id, error = %err, "truck assignment failed");
    }

    result
}

async fn assign_locked(
    state: &AppState,
    truck_id: i64,
    driver_id: Option<i64>,
) -> Result<AssignmentOutcome, AppError> {
    let _guard = state.truck_locks.lock(truck_id).await;
    let mut tx = state.pool.begin().await?;

    apply(&mut tx, truck_id, driver_id, Utc::now()).await?;

    let truck = trucks::fetch(&mut *tx, truck_id)
        .await?
        .ok_or_else(|| truck_not_found(truck_id))?;
    let driver = match driver_id {
        Some(driver_id) => drivers::fetch(&mut *tx, driver_id, &state.calendar).await?,
        None => None,
    };

    tx.commit().await?;
    Ok(AssignmentOutcome { driver, truck })
}

/// Driver-side entry point: move the driver onto `truck_id`, or free the
/// truck it currently holds.
pub async fn assign_truck_to_driver(
    state: &AppState,
    driver_id: i64,
    truck_id: Option<i64>,
) -> Result<DriverAssignment, AppError> {
    if let Some(truck_id) = truck_id {
        let outcome = assign_driver(state, truck_id, Some(driver_id)).await?;
        return Ok(DriverAssignment {
            driver: outcome.driver,
            truck: Some(outcome.truck),
        });
    }

    let started = Instant::now();
    let result = release_driver(state, driver_id).await;

    state
        .metrics
        .observe_assignment("unassign", result.is_ok(), started.elapsed());
    if let Err(err) = &result {
        warn!(driver_id, error = %err, "driver release failed");
    }

    let truck = result?;
    let driver = drivers::fetch(&state.pool, driver_id, &state.calendar).await?;
    Ok(DriverAssignment { driver, truck })
}

/// Frees whatever truck the driver holds. The truck read before locking is
/// only a hint: the release is keyed on both ids, and a driver that moved
/// while we waited is looked up again under the new truck's lock.
async fn release_driver(state: &AppState, driver_id: i64) -> Result<Option<Truck>, AppError> {
    let mut held = drivers::current_truck(&state.pool, driver_id)
        .await?
        .ok_or_else(|| driver_not_found(driver_id))?;

    for _ in 0..LOCK_ATTEMPTS {
        let Some(truck_id) = held else {
            return Ok(None);
        };
        let _guard = state.truck_locks.lock(truck_id).await;
        let mut tx = state.pool.begin().await?;

        if drivers::detach_if_holding(&mut *tx, driver_id, truck_id).await? {
            release(&mut tx, truck_id, UNASSIGNED_NOTE, Utc::now()).await?;
            let truck = trucks::fetch(&mut *tx, truck_id).await?;
            tx.commit().await?;
            info!(driver_id, truck_id, "driver released its truck");
            return Ok(truck);
        }

        held = drivers::current_truck(&mut *tx, driver_id)
            .await?
            .ok_or_else(|| driver_not_found(driver_id))?;
        tx.rollback().await?;
    }

    match held {
        None => Ok(None),
        Some(_) => Err(kept_moving(driver_id)),
    }
}

pub async fn create_driver(state: &AppState, fields: DriverFields) -> Result<Driver, AppError> {
    let _guards = state.truck_locks.lock_all(fields.truck_id).await;
    let mut tx = state.pool.begin().await?;

    let driver_id = drivers::insert(&mut *tx, &fields).await?;
    if let Some(truck_id) = fields.truck_id {
        apply(&mut tx, truck_id, Some(driver_id), Utc::now()).await?;
    }

    tx.commit().await?;
    info!(driver_id, truck_id = ?fields.truck_id, "driver created");
    Ok(fields.into_driver(driver_id))
}

/// Generic driver edit. A change of `truck_id` is routed through the same
/// release/assign steps as the dedicated endpoint, so it is audited too.
pub async fn update_driver(
    state: &AppState,
    driver_id: i64,
    fields: DriverFields,
) -> Result<Driver, AppError> {
    let mut known = drivers::current_truck(&state.pool, driver_id)
        .await?
        .flatten();

    for _ in 0..LOCK_ATTEMPTS {
        let _guards = state
            .truck_locks
            .lock_all(known.into_iter().chain(fields.truck_id))
            .await;

        let mut tx = state.pool.begin().await?;
        drivers::update_profile(&mut *tx, driver_id, &fields).await?;

        let current = drivers::current_truck(&mut *tx, driver_id).await?;
        let held = current.flatten();
        if held.is_some() && held != known && held != fields.truck_id {
            // Moved onto a truck we hold no lock for.
            tx.rollback().await?;
            known = held;
            continue;
        }

        if let Some(current) = current.filter(|current| *current != fields.truck_id) {
            let at = Utc::now();
            if let Some(old_truck) = current {
                release(&mut tx, old_truck, UNASSIGNED_NOTE, at).await?;
            }
            if let Some(new_truck) = fields.truck_id {
                apply(&mut tx, new_truck, Some(driver_id), at).await?;
            }
            info!(driver_id, from = ?current, to = ?fields.truck_id, "driver truck changed by edit");
        }

        tx.commit().await?;
        return Ok(fields.into_driver(driver_id));
    }

    Err(kept_moving(driver_id))
}

pub async fn delete_driver(state: &AppState, driver_id: i64) -> Result<(), AppError> {
    let mut known = drivers::current_truck(&state.pool, driver_id)
        .await?
        .flatten();

    for _ in 0..LOCK_ATTEMPTS {
        let _guards = state.truck_locks.lock_all(known).await;
        let mut tx = state.pool.begin().await?;

        let held = drivers::delete_returning_truck(&mut *tx, driver_id)
            .await?
            .flatten();
        if held.is_some() && held != known {
            tx.rollback().await?;
            known = held;
            continue;
        }

        if let Some(truck_id) = held {
            let note = format!("Unassigned driver ID {driver_id} (driver deleted)");
            release(&mut tx, truck_id, &note, Utc::now()).await?;
        }
        tx.commit().await?;

        info!(driver_id, "driver deleted");
        return Ok(());
    }

    Err(kept_moving(driver_id))
}

/// Truck edit. Status stays `assigned` while a driver holds the truck, and
/// cannot be set to `assigned` by hand.
pub async fn update_truck(
    state: &AppState,
    truck_id: i64,
    fields: TruckFields,
) -> Result<Truck, AppError> {
    let _guard = state.truck_locks.lock(truck_id).await;
    let mut tx = state.pool.begin().await?;

    trucks::update_details(&mut *tx, truck_id, &fields).await?;
    let holder = drivers::holder_of(&mut *tx, truck_id).await?;

    let status = match (holder, fields.status) {
        (Some(_), _) => TruckStatus::Assigned,
        (None, TruckStatus::Assigned) => return Err(assigned_status_rejected()),
        (None, requested) => requested,
    };
    trucks::set_status(&mut *tx, truck_id, status).await?;

    tx.commit().await?;
    Ok(Truck {
        status,
        ..fields.into_truck(truck_id)
    })
}

/// Deletes a truck after clearing every driver reference to it. History rows
/// are kept.
pub async fn delete_truck(state: &AppState, truck_id: i64) -> Result<(), AppError> {
    let _guard = state.truck_locks.lock(truck_id).await;
    let mut tx = state.pool.begin().await?;

    let released = drivers::detach_truck(&mut *tx, truck_id).await?;
    trucks::delete(&mut *tx, truck_id).await?;

    tx.commit().await?;
    info!(truck_id, released = ?released, "truck deleted");
    Ok(())
}

pub fn assigned_status_rejected() -> AppError {
    AppError::BadRequest(
        "status 'assigned' is set by driver assignment, not by truck edits".to_string(),
    )
}

/// The assignment steps, inside the caller's transaction. The first statement
/// is a write so the transaction takes the write lock before reading.
async fn apply(
    conn: &mut SqliteConnection,
    truck_id: i64,
    driver_id: Option<i64>,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    let released = drivers::detach_truck(&mut *conn, truck_id).await?;
    if !trucks::exists(&mut *conn, truck_id).await? {
        return Err(truck_not_found(truck_id));
    }

    let Some(driver_id) = driver_id else {
        trucks::set_status(&mut *conn, truck_id, TruckStatus::Available).await?;
        truck_history::append(
            &mut *conn,
            &NewHistoryEntry {
                truck_id,
                driver_id: None,
                kind: HistoryKind::StatusChange,
                notes: Some(UNASSIGNED_NOTE.to_string()),
                at,
            },
        )
        .await?;

        info!(truck_id, released = ?released, "truck unassigned");
        return Ok(());
    };

    let previous_truck = drivers::current_truck(&mut *conn, driver_id)
        .await?
        .ok_or_else(|| driver_not_found(driver_id))?;

    drivers::set_truck(&mut *conn, driver_id, Some(truck_id)).await?;
    trucks::set_status(&mut *conn, truck_id, TruckStatus::Assigned).await?;
    truck_history::append(
        &mut *conn,
        &NewHistoryEntry {
            truck_id,
            driver_id: Some(driver_id),
            kind: HistoryKind::Assignment,
            notes: Some(format!("Assigned driver ID {driver_id}")),
            at,
        },
    )
    .await?;

    let moved_from = previous_truck.filter(|previous| *previous != truck_id);
    if let Some(previous) = moved_from {
        if trucks::release_if_assigned(&mut *conn, previous).await? {
            truck_history::append(
                &mut *conn,
                &NewHistoryEntry {
                    truck_id: previous,
                    driver_id: Some(driver_id),
                    kind: HistoryKind::StatusChange,
                    notes: Some(format!("Driver ID {driver_id} moved to truck {truck_id}")),
                    at,
                },
            )
            .await?;
        }
    }

    info!(truck_id, driver_id, released = ?released, previous_truck = ?previous_truck, "driver assigned to truck");
    Ok(())
}

/// Frees a truck from the driver side. A truck row that no longer exists is
/// skipped rather than failing the driver operation.
async fn release(
    conn: &mut SqliteConnection,
    truck_id: i64,
    note: &str,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    drivers::detach_truck(&mut *conn, truck_id).await?;
    if !trucks::exists(&mut *conn, truck_id).await? {
        warn!(truck_id, "released truck no longer exists");
        return Ok(());
    }

    trucks::set_status(&mut *conn, truck_id, TruckStatus::Available).await?;
    truck_history::append(
        &mut *conn,
        &NewHistoryEntry {
            truck_id,
            driver_id: None,
            kind: HistoryKind::StatusChange,
            notes: Some(note.to_string()),
            at,
        },
    )
    .await?;
    Ok(())
}

fn truck_not_found(truck_id: i64) -> AppError {
    AppError::NotFound(format!("truck {truck_id} not found"))
}

fn driver_not_found(driver_id: i64) -> AppError {
    AppError::NotFound(format!("driver {driver_id} not found"))
}

fn kept_moving(driver_id: i64) -> AppError {
    AppError::Conflict(format!(
        "driver {driver_id} kept changing trucks, retry the request"
    ))
}
