//! # Bitfield Codec
//!
//! Integer flag fields (`flags`, `public_flags`) carry one boolean per bit.
//! A [`BitfieldSpec`] names the bits this build knows about; everything else
//! is a flag the platform added after this build was released.
//!
//! ## Round-Trip Invariant
//!
//! Decoding never drops bits. [`BitfieldSpec::decode`] returns the named
//! flags plus `raw & !known_mask`, and [`FlagSet::bits`] ORs them back:
//!
//! - `encode(decode(r)) == r` for every `u64` `r`;
//! - `decode(encode(f, p)) == (f, p)` for every known flag set `f` and every
//!   `p` with `p & known_mask == 0`.

use std::collections::BTreeSet;

use crate::error::BitfieldError;

/// A single named bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDef {
    pub name: &'static str,
    pub bit: u8,
}

impl FlagDef {
    pub const fn new(name: &'static str, bit: u8) -> Self {
        Self { name, bit }
    }

    pub const fn value(&self) -> u64 {
        1u64 << self.bit
    }
}

/// The named bits of one flag field.
#[derive(Debug)]
pub struct BitfieldSpec {
    name: &'static str,
    flags: &'static [FlagDef],
}

impl BitfieldSpec {
    pub const fn new(name: &'static str, flags: &'static [FlagDef]) -> Self {
        Self { name, flags }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn flags(&self) -> &'static [FlagDef] {
        self.flags
    }

    /// OR of every named bit.
    pub const fn known_mask(&self) -> u64 {
        let mut mask = 0u64;
        let mut i = 0;
        while i < self.flags.len() {
            mask |= self.flags[i].value();
            i += 1;
        }
        mask
    }

    /// Bit value for a flag name.
    pub fn bit_of(&self, name: &str) -> Option<u64> {
        self.flags.iter().find(|f| f.name == name).map(FlagDef::value)
    }

    /// Split a raw integer into named flags and preserved unknown bits.
    pub fn decode(&'static self, raw: u64) -> FlagSet {
        let names = self
            .flags
            .iter()
            .filter(|f| raw & f.value() != 0)
            .map(|f| f.name)
            .collect();
        FlagSet {
            spec: self,
            names,
            preserved: raw & !self.known_mask(),
        }
    }

    /// Combine named flags with preserved bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitfieldError::UnknownFlag`] for a name this bitfield does
    /// not declare.
    pub fn encode<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
        preserved: u64,
    ) -> Result<u64, BitfieldError> {
        let mut raw = preserved;
        for name in names {
            raw |= self.bit_of(name).ok_or_else(|| BitfieldError::UnknownFlag {
                bitfield: self.name,
                flag: name.to_string(),
            })?;
        }
        Ok(raw)
    }
}

/// A decoded flag field.
#[derive(Debug, Clone)]
pub struct FlagSet {
    spec: &'static BitfieldSpec,
    names: BTreeSet<&'static str>,
    preserved: u64,
}

impl FlagSet {
    pub fn empty(spec: &'static BitfieldSpec) -> Self {
        Self {
            spec,
            names: BTreeSet::new(),
            preserved: 0,
        }
    }

    pub fn spec(&self) -> &'static BitfieldSpec {
        self.spec
    }

    pub fn names(&self) -> &BTreeSet<&'static str> {
        &self.names
    }

    /// Bits set on the wire that no named flag claims.
    pub fn preserved(&self) -> u64 {
        self.preserved
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.preserved == 0
    }

    /// Set a named flag. Returns whether it was newly set.
    ///
    /// # Errors
    ///
    /// Returns [`BitfieldError::UnknownFlag`] if the name is not declared.
    pub fn insert(&mut self, name: &str) -> Result<bool, BitfieldError> {
        let def = self
            .spec
            .flags
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| BitfieldError::UnknownFlag {
                bitfield: self.spec.name,
                flag: name.to_string(),
            })?;
        Ok(self.names.insert(def.name))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// The wire integer.
    pub fn bits(&self) -> u64 {
        self.spec
            .flags
            .iter()
            .filter(|f| self.names.contains(f.name))
            .fold(self.preserved, |acc, f| acc | f.value())
    }
}

impl PartialEq for FlagSet {
    fn eq(&self, other: &Self) -> bool {
        self.spec.name == other.spec.name
            && self.names == other.names
            && self.preserved == other.preserved
    }
}

impl Eq for FlagSet {}

// ---------------------------------------------------------------------------
// Protocol bitfields
// ---------------------------------------------------------------------------

/// Message `flags`.
pub static MESSAGE_FLAGS: BitfieldSpec = BitfieldSpec::new(
    "message_flags",
    &[
        FlagDef::new("CROSSPOSTED", 0),
        FlagDef::new("IS_CROSSPOST", 1),
        FlagDef::new("SUPPRESS_EMBEDS", 2),
        FlagDef::new("SOURCE_MESSAGE_DELETED", 3),
        FlagDef::new("URGENT", 4),
        FlagDef::new("HAS_THREAD", 5),
        FlagDef::new("EPHEMERAL", 6),
        FlagDef::new("LOADING", 7),
        FlagDef::new("FAILED_TO_MENTION_SOME_ROLES_IN_THREAD", 8),
        FlagDef::new("SUPPRESS_NOTIFICATIONS", 12),
        FlagDef::new("IS_VOICE_MESSAGE", 13),
        FlagDef::new("HAS_SNAPSHOT", 14),
        FlagDef::new("IS_COMPONENTS_V2", 15),
    ],
);

/// Attachment `flags`.
pub static ATTACHMENT_FLAGS: BitfieldSpec = BitfieldSpec::new(
    "attachment_flags",
    &[
        FlagDef::new("IS_CLIP", 0),
        FlagDef::new("IS_THUMBNAIL", 1),
        FlagDef::new("IS_REMIX", 2),
        FlagDef::new("IS_SPOILER", 3),
        FlagDef::new("CONTAINS_EXPLICIT_MEDIA", 4),
        FlagDef::new("IS_ANIMATED", 5),
    ],
);

/// Embed `flags`.
pub static EMBED_FLAGS: BitfieldSpec = BitfieldSpec::new(
    "embed_flags",
    &[
        FlagDef::new("CONTAINS_EXPLICIT_MEDIA", 4),
        FlagDef::new("IS_CONTENT_INVENTORY_ENTRY", 5),
    ],
);

/// User `public_flags`.
pub static USER_FLAGS: BitfieldSpec = BitfieldSpec::new(
    "user_flags",
    &[
        FlagDef::new("STAFF", 0),
        FlagDef::new("PARTNER", 1),
        FlagDef::new("HYPESQUAD", 2),
        FlagDef::new("BUG_HUNTER_LEVEL_1", 3),
        FlagDef::new("HYPESQUAD_ONLINE_HOUSE_1", 6),
        FlagDef::new("HYPESQUAD_ONLINE_HOUSE_2", 7),
        FlagDef::new("HYPESQUAD_ONLINE_HOUSE_3", 8),
        FlagDef::new("PREMIUM_EARLY_SUPPORTER", 9),
        FlagDef::new("TEAM_PSEUDO_USER", 10),
        FlagDef::new("BUG_HUNTER_LEVEL_2", 14),
        FlagDef::new("VERIFIED_BOT", 16),
        FlagDef::new("VERIFIED_DEVELOPER", 17),
        FlagDef::new("CERTIFIED_MODERATOR", 18),
        FlagDef::new("BOT_HTTP_INTERACTIONS", 19),
        FlagDef::new("ACTIVE_DEVELOPER", 22),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_mask_covers_named_bits() {
        assert_eq!(EMBED_FLAGS.known_mask(), 0b11_0000);
        assert_eq!(ATTACHMENT_FLAGS.known_mask(), 0b11_1111);
    }

    #[test]
    fn decode_splits_named_and_unknown_bits() {
        let raw = (1 << 6) | (1 << 2) | (1 << 40);
        let set = MESSAGE_FLAGS.decode(raw);
        assert!(set.contains("EPHEMERAL"));
        assert!(set.contains("SUPPRESS_EMBEDS"));
        assert!(!set.contains("URGENT"));
        assert_eq!(set.preserved(), 1 << 40);
        assert_eq!(set.bits(), raw);
    }

    #[test]
    fn unassigned_low_bits_are_preserved() {
        // Bits 9-11 of message flags are unassigned.
        let raw = 1 << 10;
        let set = MESSAGE_FLAGS.decode(raw);
        assert!(set.names().is_empty());
        assert_eq!(set.preserved(), raw);
        assert_eq!(set.bits(), raw);
    }

    #[test]
    fn encode_rejects_unknown_names() {
        let err = MESSAGE_FLAGS.encode(["EPHEMERAL", "SHINY"], 0).unwrap_err();
        assert_eq!(
            err,
            BitfieldError::UnknownFlag {
                bitfield: "message_flags",
                flag: "SHINY".into()
            }
        );
    }

    #[test]
    fn encode_combines_names_and_preserved() {
        let raw = MESSAGE_FLAGS.encode(["CROSSPOSTED", "LOADING"], 1 << 33).unwrap();
        assert_eq!(raw, 1 | (1 << 7) | (1 << 33));
    }

    #[test]
    fn insert_and_remove() {
        let mut set = FlagSet::empty(&ATTACHMENT_FLAGS);
        assert!(set.is_empty());
        assert!(set.insert("IS_SPOILER").unwrap());
        assert!(!set.insert("IS_SPOILER").unwrap());
        assert!(set.insert("NOPE").is_err());
        assert_eq!(set.bits(), 1 << 3);
        assert!(set.remove("IS_SPOILER"));
        assert_eq!(set.bits(), 0);
    }

    #[test]
    fn specs_declare_each_bit_once() {
        for spec in [&MESSAGE_FLAGS, &ATTACHMENT_FLAGS, &EMBED_FLAGS, &USER_FLAGS] {
            let mut seen = 0u64;
            for f in spec.flags() {
                assert_eq!(seen & f.value(), 0, "{} repeats bit {}", spec.name(), f.bit);
                seen |= f.value();
            }
            assert_eq!(seen, spec.known_mask());
        }
    }
}
