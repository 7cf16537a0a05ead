use crate::stream::Stream;

/// A position in the input, with its human-readable line and column.
///
/// `pos` is a 0-based offset in stream units (token index or byte offset),
/// `line` and `col` are 1-based. Locations are derived incrementally by the
/// stream adapter, never by re-scanning from the start of the input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Loc {
    /// 0-based offset into the stream.
    pub pos: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub col: usize,
}

impl Loc {
    /// The location of the start of any input.
    pub fn start() -> Loc {
        Loc {
            pos: 0,
            line: 1,
            col: 1,
        }
    }
}

/// Whether, and how, a parser is currently allowed to attempt recovery.
///
/// A choice runs its alternatives with recovery suspended so that an
/// uncommitted failure falls through to the next alternative instead of
/// synthesizing repairs; consuming input re-arms recovery, since at that
/// point the alternative is committed anyway.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Recovery was not requested for this parse.
    Disabled,
    /// Recovery may be attempted at the point of failure.
    Armed,
    /// Recovery is paused inside an uncommitted alternative; consuming
    /// input re-arms it.
    Suspended,
}

impl RecoveryMode {
    /// Suspend recovery for an uncommitted attempt.
    pub(crate) fn disallow(self) -> RecoveryMode {
        match self {
            RecoveryMode::Disabled => RecoveryMode::Disabled,
            _ => RecoveryMode::Suspended,
        }
    }

    pub(crate) fn is_armed(self) -> bool {
        self == RecoveryMode::Armed
    }
}

/// Per-invocation parsing context.
///
/// Carries the layout anchor column, a cached location for cheap location
/// derivation, and the recovery permission granted to this parse. Contexts
/// are plain values; "mutation" produces a new context.
#[derive(Copy, Clone, Debug)]
pub struct Ctx {
    pub(crate) anchor: usize,
    pub(crate) loc: Loc,
    pub(crate) rs: RecoveryMode,
}

impl Ctx {
    /// A fresh context for the start of the input, granting `rs` as the
    /// recovery permission for the whole parse.
    pub fn new(rs: RecoveryMode) -> Ctx {
        Ctx {
            anchor: 0,
            loc: Loc::start(),
            rs,
        }
    }

    /// The location of `pos`, derived from the cached location.
    pub(crate) fn loc_at<S: Stream + ?Sized>(&self, stream: &S, pos: usize) -> Loc {
        if pos == self.loc.pos {
            self.loc
        } else {
            stream.locate(self.loc, pos)
        }
    }

    /// A context whose cached location has been advanced to `pos`.
    pub(crate) fn update_loc<S: Stream + ?Sized>(&self, stream: &S, pos: usize) -> Ctx {
        Ctx {
            loc: self.loc_at(stream, pos),
            ..*self
        }
    }

    pub(crate) fn with_anchor(self, anchor: usize) -> Ctx {
        Ctx { anchor, ..self }
    }

    /// Re-arm a suspended recovery mode once input has been consumed.
    pub(crate) fn maybe_allow(&self, rm: RecoveryMode, consumed: bool) -> RecoveryMode {
        if rm == RecoveryMode::Suspended && consumed {
            self.rs
        } else {
            rm
        }
    }
}
