/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get,
    web::{Data, Json, Path},
};

use crate::{
    common::types::*,
    domain::{action::ui::*, types::ui::presence::*},
    environment::AppState,
    tools::error::AppError,
};

#[get("/ui/presence/{subjectId}")]
pub async fn get_presence(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<SubjectRecord>, AppError> {
    let subject_id = SubjectId(path.into_inner());

    Ok(Json(presence::get_presence(data, subject_id).await?))
}

#[get("/ui/driving-events/{subjectId}")]
pub async fn get_driving_events(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<DrivingEventsResponse>, AppError> {
    let subject_id = SubjectId(path.into_inner());

    Ok(Json(presence::get_driving_events(data, subject_id).await?))
}

#[get("/ui/history/{subjectId}")]
pub async fn get_history(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let subject_id = SubjectId(path.into_inner());

    Ok(Json(presence::get_history(data, subject_id).await?))
}
