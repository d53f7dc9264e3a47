// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use std::str::FromStr;

use coda_core::{CodaError, Message, MessageRole, MessageStatus, MessageType, NewStoredMessage};
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::Database;

const COLUMNS: &str = "id, thread_id, client_msg_id, role, message_type, agent_id, content, \
     content_json, status, turn_no, parent_id, processing_time_ms, error_message, model_used, \
     created_at, updated_at";

/// Map one row of `COLUMNS` into a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    let role: String = row.get(3)?;
    let message_type: String = row.get(4)?;
    let status: String = row.get(8)?;
    let content_json: Option<String> = row.get(7)?;

    Ok(Message {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        client_msg_id: row.get(2)?,
        role: MessageRole::from_str(&role)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        message_type: MessageType::from_str(&message_type)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        agent_id: row.get(5)?,
        content: row.get(6)?,
        content_json: content_json
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
                })
            })
            .transpose()?,
        status: MessageStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        turn_no: row.get(9)?,
        parent_id: row.get(10)?,
        processing_time_ms: row.get(11)?,
        error_message: row.get(12)?,
        model_used: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Insert a new message and return the stored row with its assigned id
/// and timestamps.
pub async fn insert_message(db: &Database, msg: &NewStoredMessage) -> Result<Message, CodaError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (thread_id, client_msg_id, role, message_type, agent_id, \
                 content, content_json, status, turn_no, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    msg.thread_id,
                    msg.client_msg_id,
                    msg.role.to_string(),
                    msg.message_type.to_string(),
                    msg.agent_id,
                    msg.content,
                    msg.content_json.as_ref().map(|v| v.to_string()),
                    msg.status.to_string(),
                    msg.turn_no,
                    msg.parent_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"))?;
            stmt.query_row(params![id], row_to_message)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read one message by its idempotency token within a thread.
pub async fn message_by_client_id(
    db: &Database,
    thread_id: &str,
    client_msg_id: &str,
) -> Result<Option<Message>, CodaError> {
    let thread_id = thread_id.to_string();
    let client_msg_id = client_msg_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE thread_id = ?1 AND client_msg_id = ?2"
            ))?;
            let result = stmt.query_row(params![thread_id, client_msg_id], row_to_message);
            match result {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a thread in creation order.
///
/// With a limit, the most recent `limit` messages are selected, still
/// returned oldest-first.
pub async fn thread_messages(
    db: &Database,
    thread_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, CodaError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM (
                             SELECT {COLUMNS} FROM messages WHERE thread_id = ?1
                             ORDER BY created_at DESC, id DESC LIMIT ?2
                         ) ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map(params![thread_id, lim], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM messages WHERE thread_id = ?1
                         ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt.query_map(params![thread_id], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a thread whose `updated_at` is strictly newer than the
/// checkpoint, oldest first. An empty checkpoint matches everything.
pub async fn messages_updated_since(
    db: &Database,
    thread_id: &str,
    checkpoint: &str,
) -> Result<Vec<Message>, CodaError> {
    let thread_id = thread_id.to_string();
    let checkpoint = checkpoint.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE thread_id = ?1 AND updated_at > ?2
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id, checkpoint], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a message's status (and error message) by idempotency token.
///
/// Returns the updated row, or `None` if no row matched.
pub async fn set_status(
    db: &Database,
    thread_id: &str,
    client_msg_id: &str,
    status: MessageStatus,
    error_message: Option<&str>,
) -> Result<Option<Message>, CodaError> {
    let thread_id = thread_id.to_string();
    let client_msg_id = client_msg_id.to_string();
    let error_message = error_message.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET status = ?1, error_message = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE thread_id = ?3 AND client_msg_id = ?4",
                params![status.to_string(), error_message, thread_id, client_msg_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE thread_id = ?1 AND client_msg_id = ?2"
            ))?;
            stmt.query_row(params![thread_id, client_msg_id], row_to_message)
                .map(Some)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
