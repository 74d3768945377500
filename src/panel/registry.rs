use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{AppointmentPanel, PanelError, PanelView};
use crate::models::Session;
use crate::store::{AppointmentManager, StoreError};

type PanelKey = (Uuid, Uuid);

pub struct HostedPanel {
    panel: AppointmentPanel,
    last_used: Instant,
}

// Hosted panels stay locked until release. Anonymous viewers get a throwaway panel.
pub enum PanelHandle {
    Hosted {
        key: PanelKey,
        guard: OwnedMutexGuard<HostedPanel>,
    },
    Transient(AppointmentPanel),
}

impl Deref for PanelHandle {
    type Target = AppointmentPanel;

    fn deref(&self) -> &Self::Target {
        match self {
            PanelHandle::Hosted { guard, .. } => &guard.panel,
            PanelHandle::Transient(panel) => panel,
        }
    }
}

impl DerefMut for PanelHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PanelHandle::Hosted { guard, .. } => &mut guard.panel,
            PanelHandle::Transient(panel) => panel,
        }
    }
}

pub struct PanelRegistry {
    panels: Mutex<HashMap<PanelKey, Arc<AsyncMutex<HostedPanel>>>>,
    idle_after: Duration,
}

impl PanelRegistry {
    pub fn new(idle_after: Duration) -> Self {
        Self {
            panels: Mutex::new(HashMap::new()),
            idle_after,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.panels.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn remove(&self, key: &PanelKey) {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drop panels nobody touched within the idle window. A panel another
    /// request has cloned out of the map is in use and kept.
    fn evict_idle(&self) {
        let idle_after = self.idle_after;
        let mut panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
        let before = panels.len();
        panels.retain(|_, hosted| {
            if Arc::strong_count(hosted) > 1 {
                return true;
            }
            match hosted.try_lock() {
                Ok(h) => h.last_used.elapsed() < idle_after,
                Err(_) => true,
            }
        });
        let evicted = before - panels.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle panels");
        }
    }

    pub async fn acquire(
        &self,
        session: Option<&Session>,
        appointment_id: Uuid,
        store: &dyn AppointmentManager,
    ) -> Result<PanelHandle, PanelError> {
        self.evict_idle();

        let Some(session) = session else {
            let appointment = store
                .get_appointment(appointment_id)
                .await?
                .ok_or(StoreError::NotFound(appointment_id))?;
            return Ok(PanelHandle::Transient(AppointmentPanel::new(appointment, None)));
        };

        let key = (session.session_id, appointment_id);
        let Some(appointment) = store.get_appointment(appointment_id).await? else {
            self.remove(&key);
            return Err(StoreError::NotFound(appointment_id).into());
        };

        let hosted = {
            let mut panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
            panels
                .entry(key)
                .or_insert_with(|| {
                    tracing::debug!(%appointment_id, session_id = %session.session_id, "panel opened");
                    Arc::new(AsyncMutex::new(HostedPanel {
                        panel: AppointmentPanel::new(appointment.clone(), Some(session)),
                        last_used: Instant::now(),
                    }))
                })
                .clone()
        };

        let mut guard = hosted.lock_owned().await;
        guard.last_used = Instant::now();
        guard.panel.refresh(appointment);

        Ok(PanelHandle::Hosted { key, guard })
    }

    pub fn close(&self, session: Option<&Session>, appointment_id: Uuid) {
        let Some(session) = session else {
            return;
        };
        self.remove(&(session.session_id, appointment_id));
        tracing::debug!(%appointment_id, session_id = %session.session_id, "panel closed");
    }

    /// Re-read the appointment, render, and stop hosting the panel if it closed.
    pub async fn release(
        &self,
        mut handle: PanelHandle,
        store: &dyn AppointmentManager,
    ) -> Result<PanelView, PanelError> {
        if !handle.is_closed() {
            let appointment_id = handle.appointment().id;
            match store.get_appointment(appointment_id).await? {
                Some(appointment) => handle.refresh(appointment),
                None => {
                    handle.close();
                }
            }
        }

        let view = handle.render();

        if let PanelHandle::Hosted { key, guard } = handle {
            let closed = guard.panel.is_closed();
            drop(guard);
            if closed {
                self.remove(&key);
            }
        }

        Ok(view)
    }
}
