//! Process-wide sharded interner for identifiers.
//!
//! Every identifier in a description file, every builtin name and every
//! struct field is interned once and compared as a 32-bit [`Name`]. The
//! interner is global because names flow between execution contexts on
//! different worker threads and must compare equal everywhere.
//!
//! Uses 16 shards with a per-shard `RwLock`. Strings are leaked and never
//! deallocated, so [`Name::as_str`] can hand out `&'static str`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// Interned identifier.
///
/// Layout: 32-bit index split into shard (4 bits) + local index (28 bits).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Maximum local index per shard.
    const MAX_LOCAL: u32 = 0x0FFF_FFFF;

    /// Number of shards.
    const NUM_SHARDS: usize = 16;

    #[inline]
    const fn from_parts(shard: u32, local: u32) -> Self {
        Name((shard << 28) | (local & Self::MAX_LOCAL))
    }

    #[inline]
    const fn shard(self) -> usize {
        (self.0 >> 28) as usize
    }

    #[inline]
    const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    /// Intern `s` in the process-wide interner.
    pub fn intern(s: &str) -> Name {
        interner().intern(s)
    }

    /// The interned text.
    pub fn as_str(self) -> &'static str {
        interner().lookup(self)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::intern(s)
    }
}

/// Per-shard storage for interned strings.
struct InternShard {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        shard.map.insert("", 0);
        shard.strings.push("");
        shard
    }
}

struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
}

impl StringInterner {
    fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });
        Self { shards }
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        if s.is_empty() {
            return 0;
        }
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::NUM_SHARDS
    }

    fn intern(&self, s: &str) -> Name {
        let shard_idx = Self::shard_for(s);
        let shard = &self.shards[shard_idx];
        #[expect(clippy::cast_possible_truncation, reason = "shard index is < 16")]
        let shard_tag = shard_idx as u32;

        if let Some(&local) = shard.read().map.get(s) {
            return Name::from_parts(shard_tag, local);
        }

        let mut guard = shard.write();
        // Another thread may have won the race between the two locks.
        if let Some(&local) = guard.map.get(s) {
            return Name::from_parts(shard_tag, local);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let local = u32::try_from(guard.strings.len()).unwrap_or(Name::MAX_LOCAL);
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);
        Name::from_parts(shard_tag, local)
    }

    fn lookup(&self, name: Name) -> &'static str {
        self.shards[name.shard()]
            .read()
            .strings
            .get(name.local())
            .copied()
            .unwrap_or("")
    }
}

fn interner() -> &'static StringInterner {
    static INTERNER: OnceLock<StringInterner> = OnceLock::new();
    INTERNER.get_or_init(StringInterner::new)
}

#[cfg(test)]
mod tests;
