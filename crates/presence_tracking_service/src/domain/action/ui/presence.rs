/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::types::*, domain::types::ui::presence::*, environment::AppState,
    tools::error::AppError,
};
use actix_web::web::Data;

pub async fn get_presence(
    data: Data<AppState>,
    subject_id: SubjectId,
) -> Result<SubjectRecord, AppError> {
    data.subject_records
        .get(&subject_id)
        .await
        .ok_or_else(|| AppError::SubjectNotFound(subject_id.inner()))
}

pub async fn get_driving_events(
    data: Data<AppState>,
    subject_id: SubjectId,
) -> Result<DrivingEventsResponse, AppError> {
    let events = data.event_log.driving_events(&subject_id).await;
    Ok(DrivingEventsResponse { subject_id, events })
}

pub async fn get_history(
    data: Data<AppState>,
    subject_id: SubjectId,
) -> Result<HistoryResponse, AppError> {
    let points = data.event_log.history(&subject_id).await;
    Ok(HistoryResponse { subject_id, points })
}
