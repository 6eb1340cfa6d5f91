use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tally_types::{
    AccountLookupResult, Batch, CommitTransferResult, CreateAccountResult, CreateTransferResult,
    Operation, Results,
};
use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};
use crate::reply::Reply;

/// Largest payload accepted in either direction. Sized so that a full batch
/// of the widest command, or a full lookup reply, still fits.
pub const MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;
/// Most commands accepted in one batch, for every operation.
pub const MAX_BATCH_LEN: usize = 8191;
/// `[1 byte operation][4 bytes little-endian count]`.
pub const HEADER_SIZE: usize = 5;

/// Codec for batches (client → engine) and replies (engine → client).
pub struct BatchCodec;

impl BatchCodec {
    /// Encode a batch: `[operation][command count][bincode commands]`.
    pub fn encode_batch(batch: &Batch) -> ProtocolResult<Bytes> {
        if batch.is_empty() {
            return Err(ProtocolError::EmptyBatch);
        }
        if batch.len() > MAX_BATCH_LEN {
            return Err(ProtocolError::BatchTooLarge {
                len: batch.len(),
                max: MAX_BATCH_LEN,
            });
        }
        let payload = match batch {
            Batch::CreateAccounts(v) => serialize(v)?,
            Batch::CreateTransfers(v) => serialize(v)?,
            Batch::CommitTransfers(v) => serialize(v)?,
            Batch::LookupAccounts(v) => serialize(v)?,
        };
        frame(batch.operation(), batch.len(), payload)
    }

    /// Decode a batch payload, as the engine does on receipt.
    pub fn decode_batch(data: &[u8]) -> ProtocolResult<Batch> {
        let (operation, count, payload) = split_header(data)?;
        let batch = match operation {
            Operation::CreateAccounts => Batch::CreateAccounts(deserialize(payload)?),
            Operation::CreateTransfers => Batch::CreateTransfers(deserialize(payload)?),
            Operation::CommitTransfers => Batch::CommitTransfers(deserialize(payload)?),
            Operation::LookupAccounts => Batch::LookupAccounts(deserialize(payload)?),
        };
        if batch.len() != count {
            return Err(ProtocolError::CountMismatch {
                declared: count,
                actual: batch.len(),
            });
        }
        if batch.is_empty() {
            return Err(ProtocolError::EmptyBatch);
        }
        Ok(batch)
    }

    /// Encode a reply: `[operation][evaluated][bincode entries]`.
    pub fn encode_reply(reply: &Reply) -> ProtocolResult<Bytes> {
        let payload = match reply {
            Reply::CreateAccounts { errors, .. } => serialize(errors)?,
            Reply::CreateTransfers { errors, .. } => serialize(errors)?,
            Reply::CommitTransfers { errors, .. } => serialize(errors)?,
            Reply::LookupAccounts(results) => serialize(results)?,
        };
        frame(reply.operation(), reply.evaluated(), payload)
    }

    /// Decode a reply frame without checking it against a batch.
    pub fn decode_reply_frame(data: &[u8]) -> ProtocolResult<Reply> {
        let (operation, evaluated, payload) = split_header(data)?;
        let evaluated_u32 = evaluated as u32;
        let reply = match operation {
            Operation::CreateAccounts => Reply::CreateAccounts {
                evaluated: evaluated_u32,
                errors: deserialize(payload)?,
            },
            Operation::CreateTransfers => Reply::CreateTransfers {
                evaluated: evaluated_u32,
                errors: deserialize(payload)?,
            },
            Operation::CommitTransfers => Reply::CommitTransfers {
                evaluated: evaluated_u32,
                errors: deserialize(payload)?,
            },
            Operation::LookupAccounts => {
                let results: Vec<AccountLookupResult> = deserialize(payload)?;
                if results.len() != evaluated {
                    return Err(ProtocolError::CountMismatch {
                        declared: evaluated,
                        actual: results.len(),
                    });
                }
                Reply::LookupAccounts(results)
            }
        };
        Ok(reply)
    }

    /// Decode a reply into a dense result sequence for a batch of
    /// `batch_len` commands of kind `expected`.
    ///
    /// The result has exactly `batch_len` entries. A reply that evaluated
    /// fewer commands than were submitted is a systemic failure
    /// ([`ProtocolError::Truncated`]), never a partial success.
    pub fn decode_reply(
        expected: Operation,
        batch_len: usize,
        data: &[u8],
    ) -> ProtocolResult<Results> {
        let reply = Self::decode_reply_frame(data)?;
        if reply.operation() != expected {
            return Err(ProtocolError::OperationMismatch {
                expected,
                actual: reply.operation(),
            });
        }
        let evaluated = reply.evaluated();
        if evaluated > batch_len {
            return Err(ProtocolError::TooManyResults {
                evaluated,
                expected: batch_len,
            });
        }
        if evaluated < batch_len {
            return Err(ProtocolError::Truncated {
                evaluated,
                expected: batch_len,
            });
        }

        let results = match reply {
            Reply::CreateAccounts { errors, .. } => Results::CreateAccounts(densify(
                batch_len,
                errors,
                CreateAccountResult::ok,
                CreateAccountResult::err,
            )?),
            Reply::CreateTransfers { errors, .. } => Results::CreateTransfers(densify(
                batch_len,
                errors,
                CreateTransferResult::ok,
                CreateTransferResult::err,
            )?),
            Reply::CommitTransfers { errors, .. } => Results::CommitTransfers(densify(
                batch_len,
                errors,
                CommitTransferResult::ok,
                CommitTransferResult::err,
            )?),
            Reply::LookupAccounts(results) => {
                for (position, result) in results.iter().enumerate() {
                    if let AccountLookupResult::Missing { index, .. } = result {
                        if *index as usize != position {
                            return Err(ProtocolError::InvalidIndex {
                                index: *index,
                                len: batch_len,
                            });
                        }
                    }
                }
                Results::LookupAccounts(results)
            }
        };
        trace!(operation = %expected, len = batch_len, "decoded reply");
        Ok(results)
    }
}

/// Expand sparse `(index, error)` pairs into one entry per command.
fn densify<E, R>(
    len: usize,
    errors: Vec<(u32, E)>,
    ok: fn(u32) -> R,
    err: fn(u32, E) -> R,
) -> ProtocolResult<Vec<R>> {
    let mut out: Vec<R> = (0..len as u32).map(ok).collect();
    let mut last: Option<u32> = None;
    for (index, error) in errors {
        if index as usize >= len || last.is_some_and(|prev| index <= prev) {
            return Err(ProtocolError::InvalidIndex { index, len });
        }
        out[index as usize] = err(index, error);
        last = Some(index);
    }
    Ok(out)
}

fn serialize<T: Serialize + ?Sized>(value: &T) -> ProtocolResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
    bincode::deserialize(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
}

fn frame(operation: Operation, count: usize, payload: Vec<u8>) -> ProtocolResult<Bytes> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(operation.code());
    buf.put_u32_le(count as u32);
    buf.extend_from_slice(&payload);
    Ok(buf.freeze())
}

fn split_header(data: &[u8]) -> ProtocolResult<(Operation, usize, &[u8])> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::FramingError(format!(
            "too short: {} bytes, header needs {HEADER_SIZE}",
            data.len()
        )));
    }
    let payload = &data[HEADER_SIZE..];
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let operation =
        Operation::try_from(data[0]).map_err(|_| ProtocolError::UnknownOperation(data[0]))?;
    let mut count = [0u8; 4];
    count.copy_from_slice(&data[1..HEADER_SIZE]);
    Ok((operation, u32::from_le_bytes(count) as usize, payload))
}
