//! Preparation: numbers the tree, then resolves how far each session's
//! service-hook overrides (prologue/epilogue/keepalive/exception,
//! `track_conf`) reach into its descendants.
//!
//! `Handdown::None` survives zero further session boundaries beyond the
//! session that sets it (it is not handed down at all), `Children`
//! survives exactly one, `Descendants` survives forever (until
//! overridden again). Modeled as a hop counter rather than literal
//! "children only" bookkeeping, since it composes cleanly while
//! descending: each session boundary crossed decrements the counter by
//! one, and it is dropped once it would go negative.

use tester_core::{number_config, Config, Handdown, RunItemId, SessionHooks, TrackConf};

use crate::error::PipelineError;

#[derive(Clone)]
struct Inherited<T> {
    value: T,
    /// `None` = survives indefinitely (`Descendants`).
    remaining: Option<u32>,
}

impl<T> Inherited<T> {
    fn step(&self) -> Option<Inherited<T>>
    where
        T: Clone,
    {
        match self.remaining {
            Some(0) => None,
            Some(n) => Some(Inherited { value: self.value.clone(), remaining: Some(n - 1) }),
            None => Some(Inherited { value: self.value.clone(), remaining: None }),
        }
    }
}

/// What a session's own override becomes for the session(s) past it.
/// The outer `Option` is `None` when the override is not handed down at
/// all (`Handdown::None`); otherwise it carries the remaining-hop count
/// to store (`None` = indefinite).
fn handdown_next(h: Handdown) -> Option<Option<u32>> {
    match h {
        Handdown::None => None,
        Handdown::Children => Some(Some(0)),
        Handdown::Descendants => Some(None),
    }
}

#[derive(Clone, Default)]
pub struct InheritedHooks {
    prologue: Option<Inherited<RunItemId>>,
    epilogue: Option<Inherited<RunItemId>>,
    keepalive: Option<Inherited<RunItemId>>,
    exception: Option<Inherited<RunItemId>>,
    track_conf: Option<Inherited<TrackConf>>,
}

impl InheritedHooks {
    pub fn root() -> Self {
        InheritedHooks::default()
    }
}

/// What a session actually uses for its own prologue/epilogue/keepalive/
/// exception/`track_conf`, resolved from its own overrides falling back
/// to whatever was handed down.
#[derive(Clone, Copy)]
pub struct EffectiveHooks {
    pub prologue: Option<RunItemId>,
    pub epilogue: Option<RunItemId>,
    pub keepalive: Option<RunItemId>,
    pub exception: Option<RunItemId>,
    pub track_conf: TrackConf,
}

/// Resolve a session's effective hooks and compute what its children
/// should inherit.
pub fn enter_session(hooks: &SessionHooks, inherited: &InheritedHooks) -> (EffectiveHooks, InheritedHooks) {
    let effective = EffectiveHooks {
        prologue: hooks.prologue.map(|h| h.item).or_else(|| inherited.prologue.as_ref().map(|i| i.value)),
        epilogue: hooks.epilogue.map(|h| h.item).or_else(|| inherited.epilogue.as_ref().map(|i| i.value)),
        keepalive: hooks.keepalive.map(|h| h.item).or_else(|| inherited.keepalive.as_ref().map(|i| i.value)),
        exception: hooks.exception.map(|h| h.item).or_else(|| inherited.exception.as_ref().map(|i| i.value)),
        track_conf: hooks.track_conf.map(|(t, _)| t).or_else(|| inherited.track_conf.as_ref().map(|i| i.value)).unwrap_or_default(),
    };

    // A session's own override always replaces whatever slot it inherited;
    // only the absence of an own override falls through to stepping the
    // inherited slot one hop further.
    let next = InheritedHooks {
        prologue: match hooks.prologue {
            Some(h) => handdown_next(h.handdown).map(|remaining| Inherited { value: h.item, remaining }),
            None => inherited.prologue.as_ref().and_then(Inherited::step),
        },
        epilogue: match hooks.epilogue {
            Some(h) => handdown_next(h.handdown).map(|remaining| Inherited { value: h.item, remaining }),
            None => inherited.epilogue.as_ref().and_then(Inherited::step),
        },
        keepalive: match hooks.keepalive {
            Some(h) => handdown_next(h.handdown).map(|remaining| Inherited { value: h.item, remaining }),
            None => inherited.keepalive.as_ref().and_then(Inherited::step),
        },
        exception: match hooks.exception {
            Some(h) => handdown_next(h.handdown).map(|remaining| Inherited { value: h.item, remaining }),
            None => inherited.exception.as_ref().and_then(Inherited::step),
        },
        track_conf: match hooks.track_conf {
            Some((t, hd)) => handdown_next(hd).map(|remaining| Inherited { value: t, remaining }),
            None => inherited.track_conf.as_ref().and_then(Inherited::step),
        },
    };

    (effective, next)
}

/// Number the tree; the one-time entry point before walking.
pub fn prepare_config(config: &mut Config) -> Result<(), PipelineError> {
    number_config(config).map_err(PipelineError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tester_core::HookSlot;

    fn slot(id: u32, handdown: Handdown) -> HookSlot {
        HookSlot { item: RunItemId(id), handdown }
    }

    #[test]
    fn none_handdown_does_not_reach_a_nested_session() {
        let hooks = SessionHooks { keepalive: Some(slot(1, Handdown::None)), ..Default::default() };
        let (eff, next) = enter_session(&hooks, &InheritedHooks::root());
        assert_eq!(eff.keepalive, Some(RunItemId(1)));

        let (nested_eff, _) = enter_session(&SessionHooks::default(), &next);
        assert_eq!(nested_eff.keepalive, None);
    }

    #[test]
    fn children_handdown_reaches_exactly_one_session_hop() {
        let hooks = SessionHooks { prologue: Some(slot(2, Handdown::Children)), ..Default::default() };
        let (_, next) = enter_session(&hooks, &InheritedHooks::root());

        let (grandchild_eff, next2) = enter_session(&SessionHooks::default(), &next);
        assert_eq!(grandchild_eff.prologue, Some(RunItemId(2)));

        let (great_grandchild_eff, _) = enter_session(&SessionHooks::default(), &next2);
        assert_eq!(great_grandchild_eff.prologue, None);
    }

    #[test]
    fn descendants_handdown_reaches_indefinitely() {
        let hooks = SessionHooks { exception: Some(slot(3, Handdown::Descendants)), ..Default::default() };
        let (_, mut next) = enter_session(&hooks, &InheritedHooks::root());
        for _ in 0..10 {
            let (eff, n) = enter_session(&SessionHooks::default(), &next);
            assert_eq!(eff.exception, Some(RunItemId(3)));
            next = n;
        }
    }
}
