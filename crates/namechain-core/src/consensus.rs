//! Consensus-hash math.
//!
//! Every block's operations are folded into a per-block consensus hash:
//! the block's ops are individually serialized and hashed into a SHA-256
//! Merkle root (the "ops hash"), which is then combined with a skip list of
//! prior consensus hashes and compressed with RIPEMD160 over SHA256 into a
//! 16-byte snapshot. Verifiers recompute every step; nothing here trusts a
//! server-supplied value.

use sha2::{Digest, Sha256};

use crate::model::record::NameOp;
use crate::model::types::ConsensusHash;

/// Deterministically serialize one operation for hashing.
///
/// The single-character wire opcode appears only here, at the serialization
/// boundary. Field order is fixed; absent fields serialize as empty so the
/// encoding is unambiguous.
pub fn serialize_op(op: &NameOp) -> String {
    let field = |v: Option<&str>| v.unwrap_or("").to_string();
    [
        op.opcode.wire_code().to_string(),
        field(op.name.as_deref()),
        field(op.preorder_name_hash.as_deref()),
        field(op.consensus_hash.as_ref().map(|h| h.as_str())),
        op.sender.clone(),
        field(op.address.as_ref().map(|a| a.as_str())),
        field(op.recipient_address.as_ref().map(|a| a.as_str())),
        field(op.value_hash.as_ref().map(|h| h.as_str())),
        op.block_number.to_string(),
        op.vtxindex.to_string(),
        op.txid.as_str().to_string(),
        op.op_fee.to_string(),
    ]
    .join(",")
}

/// SHA-256 Merkle root over one block's serialized operations, lowercase
/// hex. An empty block hashes a single empty leaf so every block has a
/// well-defined ops hash.
pub fn ops_hash(ops: &[NameOp]) -> String {
    let mut level: Vec<[u8; 32]> = if ops.is_empty() {
        vec![sha256(b"")]
    } else {
        ops.iter()
            .map(|op| sha256(serialize_op(op).as_bytes()))
            .collect()
    };

    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        let mut i = 0usize;
        while i < level.len() {
            let left = level[i];
            let right = if i + 1 < level.len() { level[i + 1] } else { level[i] };
            next.push(hash_pair(&left, &right));
            i += 2;
        }
        level = next;
    }

    hex::encode(level[0])
}

/// Fold an ops hash and the prior consensus hashes into this block's
/// consensus hash: RIPEMD160(SHA256(ops_hash + ch_1 + ch_2 + ...)) truncated to
/// 16 bytes.
pub fn make_snapshot(ops_hash_hex: &str, prev_consensus_hashes: &[ConsensusHash]) -> ConsensusHash {
    let mut h = Sha256::new();
    h.update(ops_hash_hex.as_bytes());
    for ch in prev_consensus_hashes {
        h.update(ch.as_str().as_bytes());
    }
    let rip = ripemd::Ripemd160::digest(h.finalize());
    ConsensusHash::new(hex::encode(&rip[..16]))
        .expect("truncated ripemd160 digest is always 32 hex chars")
}

/// The skip-list block heights folded into block `block`'s snapshot:
/// `block - (2^i - 1)` for `i >= 1`, bounded below by `first_block`.
pub fn skip_list_heights(block: u64, first_block: u64) -> Vec<u64> {
    let mut heights = Vec::new();
    let mut i = 1u32;
    loop {
        let offset = match 2u64.checked_pow(i) {
            Some(p) => p - 1,
            None => break,
        };
        if block < offset || block - offset < first_block {
            break;
        }
        heights.push(block - offset);
        i += 1;
    }
    heights
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let out = Sha256::digest(data);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(left);
    h.update(right);
    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
