//! Recursive scenario walker: descends the run-item tree in lock-step
//! with the flattened iteration scenario, running each selected script
//! and folding its outcome up into its enclosing sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tester_core::{
    collect_held, decode_own_combo, extend_sticky, is_run_required, Config, Flags, RequirementExpression, RunItemArena,
    RunItemId, RunItemNode, Scenario, Tin,
};

use crate::cfgmgr::ConfigManager;
use crate::error::PipelineError;
use crate::prepare::{enter_session, EffectiveHooks, InheritedHooks};
use crate::reducer::{join_status, reduce_outcome, TesterStatus};
use crate::runner::ScriptRunner;

/// Control value a callback can return to steer the walk. Ordered from
/// least to most severe; `merge` always keeps the more severe of two.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WalkCtl {
    Cont,
    Skip,
    Back,
    Fin,
    Exc,
    Break,
    Stop,
    Intr,
    Fault,
}

impl WalkCtl {
    fn severity(self) -> u8 {
        use WalkCtl::*;
        match self {
            Cont => 0,
            Skip => 1,
            Back => 2,
            Fin => 3,
            Exc => 4,
            Break => 5,
            Stop => 6,
            Intr => 7,
            Fault => 8,
        }
    }

    pub fn merge(self, other: WalkCtl) -> WalkCtl {
        if other.severity() >= self.severity() {
            other
        } else {
            self
        }
    }

    /// A terminal control value stops the walk outright rather than
    /// just skipping the current item.
    pub fn is_terminal(self) -> bool {
        matches!(self, WalkCtl::Stop | WalkCtl::Intr | WalkCtl::Fault)
    }
}

/// Observer hooks into the walk; every method defaults to `Cont` so
/// callers only override what they care about.
#[allow(unused_variables)]
pub trait Callbacks {
    fn session_start(&mut self, name: &str) -> WalkCtl {
        WalkCtl::Cont
    }
    fn session_end(&mut self, name: &str, status: TesterStatus) -> WalkCtl {
        WalkCtl::Cont
    }
    fn iter_start(&mut self, tin: Tin, name: &str) -> WalkCtl {
        WalkCtl::Cont
    }
    fn iter_end(&mut self, tin: Tin, name: &str, status: TesterStatus) -> WalkCtl {
        WalkCtl::Cont
    }
    fn repeat_start(&mut self, tin: Tin, repetition: u64) -> WalkCtl {
        WalkCtl::Cont
    }
    fn repeat_end(&mut self, tin: Tin, repetition: u64, status: TesterStatus) -> WalkCtl {
        WalkCtl::Cont
    }
}

#[derive(Default)]
pub struct NullCallbacks;
impl Callbacks for NullCallbacks {}

pub struct WalkContext<'a> {
    pub callbacks: &'a mut dyn Callbacks,
    pub runner: &'a mut dyn ScriptRunner,
    pub cfgmgr: &'a mut dyn ConfigManager,
    pub sigint: &'a AtomicBool,
    pub force_run: bool,
    /// `--req=EXPR`, evaluated against each script's held requirement
    /// tags; `None` means every non-excluded iteration is required.
    pub target_req: Option<&'a RequirementExpression>,
    /// `--no-logues`: suppress every prologue/epilogue/keepalive/exception
    /// invocation without touching which scripts are selected.
    pub skip_logues: bool,
    next_tin: u64,
}

impl<'a> WalkContext<'a> {
    pub fn new(
        callbacks: &'a mut dyn Callbacks,
        runner: &'a mut dyn ScriptRunner,
        cfgmgr: &'a mut dyn ConfigManager,
        sigint: &'a AtomicBool,
        force_run: bool,
    ) -> Self {
        WalkContext { callbacks, runner, cfgmgr, sigint, force_run, target_req: None, skip_logues: false, next_tin: 0 }
    }

    pub fn with_target_req(mut self, target_req: Option<&'a RequirementExpression>) -> Self {
        self.target_req = target_req;
        self
    }

    pub fn with_skip_logues(mut self, skip_logues: bool) -> Self {
        self.skip_logues = skip_logues;
        self
    }

    fn next_tin(&mut self) -> Tin {
        let t = self.next_tin;
        self.next_tin += 1;
        Tin(t)
    }
}

fn node_size(arena: &RunItemArena, id: RunItemId) -> u64 {
    let n = arena.get(id);
    n.n_iters * n.weight.max(1)
}

/// Walk the whole config under `scenario`, returning the root's joined
/// status.
pub fn walk_config(config: &Config, scenario: &Scenario, ctx: &mut WalkContext<'_>) -> Result<TesterStatus, PipelineError> {
    let (status, _) = walk_node(
        &config.arena,
        config.root,
        0,
        scenario,
        &InheritedHooks::root(),
        &[],
        &HashMap::new(),
        tester_core::TrackConf::default(),
        ctx,
    )?;
    Ok(status)
}

/// Run one service hook (prologue/epilogue/keepalive/exception) as a
/// bare script invocation; its own status feeds into the caller's join
/// under the given label, not its own reduced pass/fail.
fn run_service(
    arena: &RunItemArena,
    id: RunItemId,
    ctx: &mut WalkContext<'_>,
    label: TesterStatus,
    on_fail: WalkCtl,
) -> Result<(TesterStatus, WalkCtl), PipelineError> {
    if ctx.skip_logues {
        return Ok((TesterStatus::Empty, WalkCtl::Cont));
    }
    let node = arena.get(id);
    if let tester_core::RunItemKind::Script(script) = &node.kind {
        let tin = ctx.next_tin();
        let outcome = ctx.runner.run(script, &HashMap::new(), tin, Flags::NONE)?;
        let status = reduce_outcome(outcome);
        if status == TesterStatus::Passed {
            Ok((status, WalkCtl::Cont))
        } else {
            Ok((label, on_fail))
        }
    } else {
        Ok((TesterStatus::Empty, WalkCtl::Cont))
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_node(
    arena: &RunItemArena,
    id: RunItemId,
    global_base: u64,
    scenario: &Scenario,
    inherited: &InheritedHooks,
    sticky: &[tester_core::Requirement],
    bound_args: &HashMap<String, String>,
    track_conf: tester_core::TrackConf,
    ctx: &mut WalkContext<'_>,
) -> Result<(TesterStatus, WalkCtl), PipelineError> {
    if ctx.sigint.load(Ordering::Relaxed) {
        return Ok((TesterStatus::Incomplete, WalkCtl::Intr));
    }

    let node = arena.get(id);
    match &node.kind {
        tester_core::RunItemKind::Script(script) => {
            let mut joined = TesterStatus::Empty;
            let mut ctl = WalkCtl::Cont;
            let name = node.name.clone().unwrap_or_default();

            for local in 0..node.n_iters {
                if ctx.sigint.load(Ordering::Relaxed) {
                    ctl = ctl.merge(WalkCtl::Intr);
                    break;
                }
                let global = global_base + local;
                let flags = scenario.step(global);
                let (_, own_bound) = decode_own_combo(node, local);
                let mut args = bound_args.clone();
                args.extend(own_bound);

                let held = collect_held(&script.reqs, sticky, &args)?;
                let forced = ctx.force_run || flags.contains(Flags::FORCE);
                let (required, _forced) = is_run_required(ctx.target_req, &held, true, forced);
                let selected = flags.contains(Flags::RUN) && !flags.contains(Flags::EXCLUDE);

                let tin = ctx.next_tin();
                let start_ctl = ctx.callbacks.iter_start(tin, &name);
                ctl = ctl.merge(start_ctl);

                let status = if !selected || !required {
                    TesterStatus::Skipped
                } else if flags.contains(Flags::FAKE) {
                    TesterStatus::Faked
                } else {
                    let backup = if track_conf.tracks() { Some(ctx.cfgmgr.backup()?) } else { None };
                    let outcome = ctx.runner.run(script, &args, tin, flags)?;
                    let mut status = reduce_outcome(outcome);
                    if let Some(handle) = backup {
                        let clean = ctx.cfgmgr.verify(handle)?;
                        if !clean {
                            ctx.cfgmgr.restore(handle)?;
                            if track_conf.reports_drift() {
                                status = join_status(status, TesterStatus::Dirty);
                            }
                        }
                        ctx.cfgmgr.release(handle)?;
                    }
                    status
                };

                let end_ctl = ctx.callbacks.iter_end(tin, &name, status);
                ctl = ctl.merge(end_ctl);
                joined = join_status(joined, status);
                if ctl.is_terminal() || ctl == WalkCtl::Break {
                    break;
                }
            }
            Ok((joined, ctl))
        }

        tester_core::RunItemKind::Session(session) | tester_core::RunItemKind::Package(tester_core::PackageItem { session, .. }) => {
            let name = node.name.clone().unwrap_or_default();
            let (effective, child_inherited) = enter_session(&session.hooks, inherited);
            let mut joined = TesterStatus::Empty;
            let mut ctl = ctx.callbacks.session_start(&name);

            // A failed prologue marks the group and skips the rest of it,
            // but does not by itself abort the walk the way Intr does.
            let mut prologue_failed = false;
            if !ctl.is_terminal() {
                if let Some(prologue) = effective.prologue {
                    let (st, c) = run_service(arena, prologue, ctx, TesterStatus::Prolog, WalkCtl::Exc)?;
                    joined = join_status(joined, st);
                    ctl = ctl.merge(c);
                    prologue_failed = st == TesterStatus::Prolog;
                }
            }

            if !ctl.is_terminal() && !prologue_failed {
                let child_sticky = extend_sticky(sticky, &[]);
                'combo: for combo in 0..node.n_iters {
                    let combo_base = global_base + combo * node.weight.max(1);
                    let (_, own_bound) = decode_own_combo(node, combo);
                    let mut args = bound_args.clone();
                    args.extend(own_bound);

                    let mut child_offset = 0u64;
                    for &child_id in session.children.iter() {
                        if ctx.sigint.load(Ordering::Relaxed) {
                            ctl = ctl.merge(WalkCtl::Intr);
                            break 'combo;
                        }
                        if let Some(keepalive) = effective.keepalive {
                            let (st, c) = run_service(arena, keepalive, ctx, TesterStatus::Keepalive, WalkCtl::Intr)?;
                            joined = join_status(joined, st);
                            ctl = ctl.merge(c);
                            if ctl.is_terminal() {
                                break 'combo;
                            }
                        }

                        let csize = node_size(arena, child_id);
                        let (cstatus, cctl) = walk_node(
                            arena,
                            child_id,
                            combo_base + child_offset,
                            scenario,
                            &child_inherited,
                            &child_sticky,
                            &args,
                            effective.track_conf,
                            ctx,
                        )?;
                        joined = join_status(joined, cstatus);
                        ctl = ctl.merge(cctl);
                        child_offset += csize;

                        if cstatus.is_exceptional() {
                            if let Some(exception) = effective.exception {
                                let (est, ec) = run_service(arena, exception, ctx, TesterStatus::Exception, WalkCtl::Intr)?;
                                joined = join_status(joined, est);
                                ctl = ctl.merge(ec);
                            }
                        }
                        if ctl.is_terminal() {
                            break 'combo;
                        }
                    }
                }
            }

            if let Some(epilogue) = effective.epilogue {
                let (st, c) = run_service(arena, epilogue, ctx, TesterStatus::Epilog, WalkCtl::Exc)?;
                joined = join_status(joined, st);
                ctl = ctl.merge(c);
            }

            let end_ctl = ctx.callbacks.session_end(&name, joined);
            ctl = ctl.merge(end_ctl);
            let _ = effective.track_conf;
            Ok((joined, ctl))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tester_core::{number_config, RunItemArena, RunItemKind, ScriptItem, SessionHooks, SessionItem, Value, VarArg};

    use crate::cfgmgr::NoopConfigManager;
    use crate::reducer::RunOutcome;
    use crate::runner::ScriptedRunner;

    fn values(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::plain(i.to_string())).collect()
    }

    fn two_script_config() -> Config {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("root".into()),
            RunItemKind::Session(SessionItem { vars: vec![], hooks: SessionHooks::default(), children: vec![], iterate: 1 }),
            false,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            RunItemKind::Script(ScriptItem { executable: "p".into(), objective: String::new(), reqs: vec![], args: vec![VarArg::new("y", values(2))], iterate: 1 }),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.children = vec![p];
        }
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();
        config
    }

    #[test]
    fn prologue_fail_example() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("root".into()),
            RunItemKind::Session(SessionItem { vars: vec![], hooks: SessionHooks::default(), children: vec![], iterate: 1 }),
            false,
        );
        let prologue = arena.insert(
            Some(root),
            None,
            RunItemKind::Script(ScriptItem { executable: "setup".into(), objective: String::new(), reqs: vec![], args: vec![], iterate: 1 }),
            true,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            RunItemKind::Script(ScriptItem { executable: "p".into(), objective: String::new(), reqs: vec![], args: vec![], iterate: 1 }),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.hooks.prologue = Some(tester_core::HookSlot { item: prologue, handdown: tester_core::Handdown::Descendants });
            s.children = vec![p];
        }
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();

        let mut callbacks = NullCallbacks;
        // Only the failing prologue outcome is queued: if `p` were run
        // anyway, `ScriptedRunner` would panic on an empty queue.
        let mut runner = ScriptedRunner::new([RunOutcome::Exited(1)]);
        let mut cfgmgr = NoopConfigManager::default();
        let sigint = AtomicBool::new(false);
        let mut ctx = WalkContext::new(&mut callbacks, &mut runner, &mut cfgmgr, &sigint, false);

        let scenario = crate::scenario_build::whole_tree_run(&config);
        let status = walk_config(&config, &scenario, &mut ctx).unwrap();
        assert_eq!(status, TesterStatus::Prolog);
    }

    #[test]
    fn keepalive_fail_example() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("root".into()),
            RunItemKind::Session(SessionItem { vars: vec![VarArg::new("x", values(2))], hooks: SessionHooks::default(), children: vec![], iterate: 1 }),
            false,
        );
        let keepalive = arena.insert(
            Some(root),
            None,
            RunItemKind::Script(ScriptItem { executable: "ping".into(), objective: String::new(), reqs: vec![], args: vec![], iterate: 1 }),
            true,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            RunItemKind::Script(ScriptItem { executable: "p".into(), objective: String::new(), reqs: vec![], args: vec![], iterate: 1 }),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.hooks.keepalive = Some(tester_core::HookSlot { item: keepalive, handdown: tester_core::Handdown::Descendants });
            s.children = vec![p];
        }
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();

        let mut callbacks = NullCallbacks;
        // Only the failing keepalive outcome is queued: a failed keepalive
        // aborts the session immediately, so neither `p` nor the second
        // `x` value's keepalive should ever be invoked. If they were,
        // `ScriptedRunner` would panic on an empty queue.
        let mut runner = ScriptedRunner::new([RunOutcome::Exited(1)]);
        let mut cfgmgr = NoopConfigManager::default();
        let sigint = AtomicBool::new(false);
        let mut ctx = WalkContext::new(&mut callbacks, &mut runner, &mut cfgmgr, &sigint, false);

        let scenario = crate::scenario_build::whole_tree_run(&config);
        let status = walk_config(&config, &scenario, &mut ctx).unwrap();
        assert_eq!(status, TesterStatus::Keepalive);
    }

    #[test]
    fn exclude_flag_skips_without_running() {
        let config = two_script_config();
        let mut callbacks = NullCallbacks;
        let mut runner = ScriptedRunner::new([]);
        let mut cfgmgr = NoopConfigManager::default();
        let sigint = AtomicBool::new(false);
        let mut ctx = WalkContext::new(&mut callbacks, &mut runner, &mut cfgmgr, &sigint, false);

        let mut scenario = Scenario::new();
        scenario.add_flags(0, config.total_iters - 1, Flags::EXCLUDE).unwrap();
        let status = walk_config(&config, &scenario, &mut ctx).unwrap();
        assert_eq!(status, TesterStatus::Skipped);
    }

    #[test]
    fn iterations_outside_the_scenario_are_skipped_without_running() {
        let config = two_script_config();
        assert_eq!(config.total_iters, 2);

        let mut callbacks = NullCallbacks;
        // Only one outcome queued: if the uncovered second iteration were
        // run anyway, `ScriptedRunner` would panic on an empty queue.
        let mut runner = ScriptedRunner::new([RunOutcome::Exited(0)]);
        let mut cfgmgr = NoopConfigManager::default();
        let sigint = AtomicBool::new(false);
        let mut ctx = WalkContext::new(&mut callbacks, &mut runner, &mut cfgmgr, &sigint, false);

        let mut scenario = Scenario::new();
        scenario.add_flags(0, 0, Flags::RUN).unwrap();
        let status = walk_config(&config, &scenario, &mut ctx).unwrap();
        assert_eq!(status, TesterStatus::Skipped);
    }

    #[test]
    fn run_force_flag_overrides_a_failing_requirement_per_act() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("root".into()),
            RunItemKind::Session(SessionItem { vars: vec![], hooks: SessionHooks::default(), children: vec![], iterate: 1 }),
            false,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            RunItemKind::Script(ScriptItem {
                executable: "p".into(),
                objective: String::new(),
                reqs: vec![tester_core::Requirement::direct("needs-rig", false)],
                args: vec![],
                iterate: 1,
            }),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.children = vec![p];
        }
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();

        let mut callbacks = NullCallbacks;
        let mut runner = ScriptedRunner::new([RunOutcome::Exited(0)]);
        let mut cfgmgr = NoopConfigManager::default();
        let sigint = AtomicBool::new(false);
        let target_req = RequirementExpression::Value("has-rig".into());
        let mut ctx = WalkContext::new(&mut callbacks, &mut runner, &mut cfgmgr, &sigint, false).with_target_req(Some(&target_req));

        let mut scenario = Scenario::new();
        scenario.add_flags(0, 0, Flags::RUN.union(Flags::FORCE)).unwrap();
        let status = walk_config(&config, &scenario, &mut ctx).unwrap();
        assert_eq!(status, TesterStatus::Passed);
    }
}
