/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::types::*,
    domain::{action::enqueue, types::internal::places::*},
    environment::AppState,
    tools::error::AppError,
    tracker::TrackerMessage,
};
use actix_web::web::Data;

pub async fn replace_places(
    data: Data<AppState>,
    ReplacePlacesRequest { family_id, places }: ReplacePlacesRequest,
) -> Result<APISuccess, AppError> {
    if family_id != data.family_id {
        return Err(AppError::FamilyMismatch(
            data.family_id.inner(),
            family_id.inner(),
        ));
    }

    enqueue(
        &data.sender,
        TrackerMessage::ReplacePlaces { family_id, places },
    )?;

    Ok(APISuccess::default())
}
