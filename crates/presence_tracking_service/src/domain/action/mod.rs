/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod internal;
pub mod ui;

use crate::{tools::error::AppError, tracker::TrackerMessage};
use tokio::sync::mpsc::{error::TrySendError, Sender};

fn queue_error<T>(err: TrySendError<T>) -> AppError {
    match err {
        TrySendError::Full(_) => AppError::TrackerQueueFull,
        TrySendError::Closed(_) => AppError::TrackerUnavailable,
    }
}

/// Hands a message to the tracker without waiting for queue space.
pub fn enqueue(sender: &Sender<TrackerMessage>, message: TrackerMessage) -> Result<(), AppError> {
    sender.try_send(message).map_err(queue_error)
}

/// Hands all messages to the tracker or none of them. Slots for the whole batch are
/// reserved up front so a full queue rejects the request without a partial enqueue.
pub fn enqueue_all(
    sender: &Sender<TrackerMessage>,
    messages: Vec<TrackerMessage>,
) -> Result<(), AppError> {
    if messages.is_empty() {
        return Ok(());
    }
    let permits = sender
        .try_reserve_many(messages.len())
        .map_err(queue_error)?;
    for (permit, message) in permits.zip(messages) {
        permit.send(message);
    }
    Ok(())
}
