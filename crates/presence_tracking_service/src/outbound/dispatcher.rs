/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{records::SubjectRecords, types::AlertCallbackRequest};
use crate::common::types::*;
use crate::tools::{callapi::call_api, error::AppError};
use async_trait::async_trait;
use reqwest::Method;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

/// Delivers user visible alerts and keeps the shared `currentPlace` field current.
///
/// Every call is best effort. A failure is reported to the caller once and never retried.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn notify_arrival(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError>;
    async fn notify_departure(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError>;
    async fn notify_panic(&self, subject: &Subject, timestamp: TimeStamp) -> Result<(), AppError>;
    async fn notify_low_battery(
        &self,
        subject: &Subject,
        level: BatteryLevel,
        timestamp: TimeStamp,
    ) -> Result<(), AppError>;
    async fn notify_speeding(&self, event: &DrivingEvent) -> Result<(), AppError>;
    async fn notify_harsh_braking(&self, event: &DrivingEvent) -> Result<(), AppError>;
    async fn set_current_place(
        &self,
        subject_id: &SubjectId,
        place_name: Option<String>,
    ) -> Result<(), AppError>;
}

/// Append only log of driving events and sampled history points.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn append_driving_event(&self, event: &DrivingEvent) -> Result<(), AppError>;
    async fn append_history_point(&self, point: &HistoryPoint) -> Result<(), AppError>;
}

/// Posts alerts as JSON to a configured callback. Without a callback alerts are only logged.
pub struct CallbackDispatcher {
    callback_url: Option<Url>,
    subject_records: SubjectRecords,
}

impl CallbackDispatcher {
    pub fn new(callback_url: Option<Url>, subject_records: SubjectRecords) -> Self {
        Self {
            callback_url,
            subject_records,
        }
    }

    async fn send(&self, request: AlertCallbackRequest) -> Result<(), AppError> {
        info!(tag = "[Alert]", kind = %request.kind, subject_id = %request.subject_id.0, message = %request.message);

        let Some(url) = &self.callback_url else {
            return Ok(());
        };

        match call_api::<serde_json::Value, AlertCallbackRequest>(
            Method::POST,
            url,
            vec![("content-type", "application/json")],
            Some(request),
        )
        .await
        {
            // The callback may answer with an empty body.
            Ok(_) | Err(AppError::DeserializationError(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl AlertDispatcher for CallbackDispatcher {
    async fn notify_arrival(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::arrival(subject, place, timestamp))
            .await
    }

    async fn notify_departure(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::departure(subject, place, timestamp))
            .await
    }

    async fn notify_panic(&self, subject: &Subject, timestamp: TimeStamp) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::panic(subject, timestamp))
            .await
    }

    async fn notify_low_battery(
        &self,
        subject: &Subject,
        level: BatteryLevel,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::low_battery(subject, level, timestamp))
            .await
    }

    async fn notify_speeding(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::driving(event)).await
    }

    async fn notify_harsh_braking(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.send(AlertCallbackRequest::driving(event)).await
    }

    async fn set_current_place(
        &self,
        subject_id: &SubjectId,
        place_name: Option<String>,
    ) -> Result<(), AppError> {
        if self
            .subject_records
            .set_current_place(subject_id, place_name)
            .await
        {
            Ok(())
        } else {
            warn!(tag = "[Current Place]", subject_id = %subject_id.0, "No record for subject");
            Err(AppError::SubjectNotFound(subject_id.inner()))
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    driving_events: Arc<RwLock<FxHashMap<SubjectId, Vec<DrivingEvent>>>>,
    history: Arc<RwLock<FxHashMap<SubjectId, Vec<HistoryPoint>>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn driving_events(&self, subject_id: &SubjectId) -> Vec<DrivingEvent> {
        self.driving_events
            .read()
            .await
            .get(subject_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn history(&self, subject_id: &SubjectId) -> Vec<HistoryPoint> {
        self.history
            .read()
            .await
            .get(subject_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append_driving_event(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.driving_events
            .write()
            .await
            .entry(event.subject_id.to_owned())
            .or_default()
            .push(event.to_owned());
        Ok(())
    }

    async fn append_history_point(&self, point: &HistoryPoint) -> Result<(), AppError> {
        self.history
            .write()
            .await
            .entry(point.subject_id.to_owned())
            .or_default()
            .push(point.to_owned());
        Ok(())
    }
}
