//! Event subscription bitmask negotiated at identify time.
//!
//! The client tells the server which event categories it wants in the
//! `eventSubscriptions` field of Identify (and later Reidentify).  The server
//! filters on its side; the client only uses the mask for bookkeeping.
//!
//! # Bit layout
//!
//! ```text
//! bit  0..=10   low-volume categories (General … Ui); `ALL` covers these
//! bit 16..=19   high-volume categories, opt-in only
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Bitset of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSubscription(pub u32);

impl EventSubscription {
    pub const NONE: Self = Self(0);
    pub const GENERAL: Self = Self(1 << 0);
    pub const CONFIG: Self = Self(1 << 1);
    pub const SCENES: Self = Self(1 << 2);
    pub const INPUTS: Self = Self(1 << 3);
    pub const TRANSITIONS: Self = Self(1 << 4);
    pub const FILTERS: Self = Self(1 << 5);
    pub const OUTPUTS: Self = Self(1 << 6);
    pub const SCENE_ITEMS: Self = Self(1 << 7);
    pub const MEDIA_INPUTS: Self = Self(1 << 8);
    pub const VENDORS: Self = Self(1 << 9);
    pub const UI: Self = Self(1 << 10);
    /// Every low-volume category.  High-volume categories must be added explicitly.
    pub const ALL: Self = Self(0b111_1111_1111);
    pub const INPUT_VOLUME_METERS: Self = Self(1 << 16);
    pub const INPUT_ACTIVE_STATE_CHANGED: Self = Self(1 << 17);
    pub const INPUT_SHOW_STATE_CHANGED: Self = Self(1 << 18);
    pub const SCENE_ITEM_TRANSFORM_CHANGED: Self = Self(1 << 19);

    /// Named single-bit categories, used for config files and logs.
    pub const NAMED: [(&'static str, Self); 15] = [
        ("General", Self::GENERAL),
        ("Config", Self::CONFIG),
        ("Scenes", Self::SCENES),
        ("Inputs", Self::INPUTS),
        ("Transitions", Self::TRANSITIONS),
        ("Filters", Self::FILTERS),
        ("Outputs", Self::OUTPUTS),
        ("SceneItems", Self::SCENE_ITEMS),
        ("MediaInputs", Self::MEDIA_INPUTS),
        ("Vendors", Self::VENDORS),
        ("Ui", Self::UI),
        ("InputVolumeMeters", Self::INPUT_VOLUME_METERS),
        ("InputActiveStateChanged", Self::INPUT_ACTIVE_STATE_CHANGED),
        ("InputShowStateChanged", Self::INPUT_SHOW_STATE_CHANGED),
        ("SceneItemTransformChanged", Self::SCENE_ITEM_TRANSFORM_CHANGED),
    ];

    /// Returns the raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// `true` when every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` when no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Looks up a category by name.  `"All"` and `"None"` are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "All" => return Some(Self::ALL),
            "None" => return Some(Self::NONE),
            _ => {}
        }
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bit)| *bit)
    }

    /// Returns the name of a single-bit category.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, bit)| *bit == self)
            .map(|(n, _)| *n)
    }

    /// Combines a list of category names into one mask.
    ///
    /// Returns the first unrecognised name as the error.
    pub fn from_names<'a, I>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().try_fold(Self::NONE, |acc, name| {
            Self::from_name(name)
                .map(|bit| acc | bit)
                .ok_or_else(|| name.to_string())
        })
    }
}

impl BitOr for EventSubscription {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventSubscription {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventSubscription {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for EventSubscription {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return write!(f, "All");
        }
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(n, _)| *n)
            .collect();
        if names.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

// ── Event category table ──────────────────────────────────────────────────────

/// Every event the protocol defines, paired with the category bit the server
/// requires before it will send it.
pub const EVENT_CATEGORIES: &[(&str, EventSubscription)] = &[
    ("ExitStarted", EventSubscription::GENERAL),
    ("VendorEvent", EventSubscription::VENDORS),
    ("CustomEvent", EventSubscription::GENERAL),
    ("CurrentSceneCollectionChanging", EventSubscription::CONFIG),
    ("CurrentSceneCollectionChanged", EventSubscription::CONFIG),
    ("SceneCollectionListChanged", EventSubscription::CONFIG),
    ("CurrentProfileChanging", EventSubscription::CONFIG),
    ("CurrentProfileChanged", EventSubscription::CONFIG),
    ("ProfileListChanged", EventSubscription::CONFIG),
    ("SceneCreated", EventSubscription::SCENES),
    ("SceneRemoved", EventSubscription::SCENES),
    ("SceneNameChanged", EventSubscription::SCENES),
    ("CurrentProgramSceneChanged", EventSubscription::SCENES),
    ("CurrentPreviewSceneChanged", EventSubscription::SCENES),
    ("SceneListChanged", EventSubscription::SCENES),
    ("InputCreated", EventSubscription::INPUTS),
    ("InputRemoved", EventSubscription::INPUTS),
    ("InputNameChanged", EventSubscription::INPUTS),
    ("InputSettingsChanged", EventSubscription::INPUTS),
    ("InputActiveStateChanged", EventSubscription::INPUT_ACTIVE_STATE_CHANGED),
    ("InputShowStateChanged", EventSubscription::INPUT_SHOW_STATE_CHANGED),
    ("InputMuteStateChanged", EventSubscription::INPUTS),
    ("InputVolumeChanged", EventSubscription::INPUTS),
    ("InputAudioBalanceChanged", EventSubscription::INPUTS),
    ("InputAudioSyncOffsetChanged", EventSubscription::INPUTS),
    ("InputAudioTracksChanged", EventSubscription::INPUTS),
    ("InputAudioMonitorTypeChanged", EventSubscription::INPUTS),
    ("InputVolumeMeters", EventSubscription::INPUT_VOLUME_METERS),
    ("CurrentSceneTransitionChanged", EventSubscription::TRANSITIONS),
    ("CurrentSceneTransitionDurationChanged", EventSubscription::TRANSITIONS),
    ("SceneTransitionStarted", EventSubscription::TRANSITIONS),
    ("SceneTransitionEnded", EventSubscription::TRANSITIONS),
    ("SceneTransitionVideoEnded", EventSubscription::TRANSITIONS),
    ("SourceFilterListReindexed", EventSubscription::FILTERS),
    ("SourceFilterCreated", EventSubscription::FILTERS),
    ("SourceFilterRemoved", EventSubscription::FILTERS),
    ("SourceFilterNameChanged", EventSubscription::FILTERS),
    ("SourceFilterSettingsChanged", EventSubscription::FILTERS),
    ("SourceFilterEnableStateChanged", EventSubscription::FILTERS),
    ("SceneItemCreated", EventSubscription::SCENE_ITEMS),
    ("SceneItemRemoved", EventSubscription::SCENE_ITEMS),
    ("SceneItemListReindexed", EventSubscription::SCENE_ITEMS),
    ("SceneItemEnableStateChanged", EventSubscription::SCENE_ITEMS),
    ("SceneItemLockStateChanged", EventSubscription::SCENE_ITEMS),
    ("SceneItemSelected", EventSubscription::SCENE_ITEMS),
    ("SceneItemTransformChanged", EventSubscription::SCENE_ITEM_TRANSFORM_CHANGED),
    ("StreamStateChanged", EventSubscription::OUTPUTS),
    ("RecordStateChanged", EventSubscription::OUTPUTS),
    ("RecordFileChanged", EventSubscription::OUTPUTS),
    ("ReplayBufferStateChanged", EventSubscription::OUTPUTS),
    ("VirtualcamStateChanged", EventSubscription::OUTPUTS),
    ("ReplayBufferSaved", EventSubscription::OUTPUTS),
    ("MediaInputPlaybackStarted", EventSubscription::MEDIA_INPUTS),
    ("MediaInputPlaybackEnded", EventSubscription::MEDIA_INPUTS),
    ("MediaInputActionTriggered", EventSubscription::MEDIA_INPUTS),
    ("StudioModeStateChanged", EventSubscription::UI),
    ("ScreenshotSaved", EventSubscription::UI),
];

/// Returns the category bit an event requires, or `None` for event names
/// this crate does not know.
pub fn required_subscription(event_type: &str) -> Option<EventSubscription> {
    EVENT_CATEGORIES
        .iter()
        .find(|(name, _)| *name == event_type)
        .map(|(_, bit)| *bit)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
