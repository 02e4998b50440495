//! Operation kinds and their wire encoding.
//!
//! Every mutating operation is a distinct blockchain transaction type. The
//! indexer identifies them with single-character opcodes; that encoding is
//! confined to `wire_code`/`from_wire_code`; everything else works with the
//! enum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of name and namespace operations recorded on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOpKind {
    NamePreorder,
    NameRegistration,
    NameUpdate,
    NameTransfer,
    NameRenewal,
    NameRevoke,
    NameImport,
    NamespacePreorder,
    NamespaceReveal,
    NamespaceReady,
}

impl NameOpKind {
    /// The single-character opcode used on the wire.
    ///
    /// Renewal shares the registration opcode, as on chain.
    pub fn wire_code(self) -> char {
        match self {
            Self::NamePreorder => '?',
            Self::NameRegistration => ':',
            Self::NameUpdate => '+',
            Self::NameTransfer => '>',
            Self::NameRenewal => ':',
            Self::NameRevoke => '~',
            Self::NameImport => ';',
            Self::NamespacePreorder => '*',
            Self::NamespaceReveal => '&',
            Self::NamespaceReady => '!',
        }
    }

    /// Decode a wire opcode.
    ///
    /// `:` decodes to registration; renewal is distinguished by context
    /// (whether the name already exists), which the indexer resolves.
    pub fn from_wire_code(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::NamePreorder),
            ':' => Some(Self::NameRegistration),
            '+' => Some(Self::NameUpdate),
            '>' => Some(Self::NameTransfer),
            '~' => Some(Self::NameRevoke),
            ';' => Some(Self::NameImport),
            '*' => Some(Self::NamespacePreorder),
            '&' => Some(Self::NamespaceReveal),
            '!' => Some(Self::NamespaceReady),
            _ => None,
        }
    }

    /// The stable uppercase opcode name used in indexer responses.
    pub fn opcode_name(self) -> &'static str {
        match self {
            Self::NamePreorder => "NAME_PREORDER",
            Self::NameRegistration => "NAME_REGISTRATION",
            Self::NameUpdate => "NAME_UPDATE",
            Self::NameTransfer => "NAME_TRANSFER",
            Self::NameRenewal => "NAME_RENEWAL",
            Self::NameRevoke => "NAME_REVOKE",
            Self::NameImport => "NAME_IMPORT",
            Self::NamespacePreorder => "NAMESPACE_PREORDER",
            Self::NamespaceReveal => "NAMESPACE_REVEAL",
            Self::NamespaceReady => "NAMESPACE_READY",
        }
    }

    /// The lowercase id used to key queue entries.
    pub fn queue_id(self) -> &'static str {
        match self {
            Self::NamePreorder => "preorder",
            Self::NameRegistration => "register",
            Self::NameUpdate => "update",
            Self::NameTransfer => "transfer",
            Self::NameRenewal => "renew",
            Self::NameRevoke => "revoke",
            Self::NameImport => "name_import",
            Self::NamespacePreorder => "namespace_preorder",
            Self::NamespaceReveal => "namespace_reveal",
            Self::NamespaceReady => "namespace_ready",
        }
    }

    /// Parse a queue id back into a kind.
    pub fn from_queue_id(s: &str) -> Option<Self> {
        match s {
            "preorder" => Some(Self::NamePreorder),
            "register" => Some(Self::NameRegistration),
            "update" => Some(Self::NameUpdate),
            "transfer" => Some(Self::NameTransfer),
            "renew" => Some(Self::NameRenewal),
            "revoke" => Some(Self::NameRevoke),
            "name_import" => Some(Self::NameImport),
            "namespace_preorder" => Some(Self::NamespacePreorder),
            "namespace_reveal" => Some(Self::NamespaceReveal),
            "namespace_ready" => Some(Self::NamespaceReady),
            _ => None,
        }
    }

    /// True for the per-name operations the client queues and polls.
    pub fn is_name_op(self) -> bool {
        matches!(
            self,
            Self::NamePreorder
                | Self::NameRegistration
                | Self::NameUpdate
                | Self::NameTransfer
                | Self::NameRenewal
                | Self::NameRevoke
        )
    }
}

impl fmt::Display for NameOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.queue_id())
    }
}
