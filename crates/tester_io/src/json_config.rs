//! JSON-backed `ConfigSource`: a stand-in for the real config wire format
//! (XML, out of scope) that still exercises the whole preparation pass.
//!
//! One package is one `<root>/<name>.json` file, deserialized into the
//! `Raw*` DTOs below and then built into a `tester_core` arena.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tester_core::{
    number_config, Config, Handdown, HookSlot, PackageItem, Requirement, RunItemArena, RunItemId,
    RunItemKind, ScriptItem, SessionHooks, SessionItem, TrackConf, Value, VarArg,
};

use crate::config_source::ConfigSource;
use crate::error::IoError;

#[derive(Deserialize)]
struct RawValue {
    value: String,
    #[serde(default)]
    reqs: Vec<RawRequirement>,
}

#[derive(Deserialize)]
struct RawRequirement {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    arg_ref: Option<String>,
    #[serde(default)]
    sticky: bool,
}

impl RawRequirement {
    fn into_core(self) -> Requirement {
        match self.arg_ref {
            Some(name) => Requirement::arg_ref(name, self.sticky),
            None => Requirement::direct(self.id.unwrap_or_default(), self.sticky),
        }
    }
}

#[derive(Deserialize)]
struct RawVarArg {
    name: String,
    values: Vec<RawValue>,
    #[serde(default)]
    list: Option<String>,
    #[serde(default)]
    preferred: Option<usize>,
}

impl RawVarArg {
    fn into_core(self) -> VarArg {
        let values = self
            .values
            .into_iter()
            .map(|v| Value::plain(v.value).with_reqs(v.reqs.into_iter().map(RawRequirement::into_core).collect()))
            .collect();
        let mut a = VarArg::new(self.name, values);
        if let Some(list) = self.list {
            a = a.in_list(list);
        }
        if let Some(p) = self.preferred {
            a = a.with_preferred(p);
        }
        a
    }
}

#[derive(Deserialize, Default)]
struct RawHookRef {
    item: Box<RawItem>,
    #[serde(default)]
    handdown: RawHanddown,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum RawHanddown {
    None,
    Children,
    #[default]
    Descendants,
}

impl From<RawHanddown> for Handdown {
    fn from(v: RawHanddown) -> Self {
        match v {
            RawHanddown::None => Handdown::None,
            RawHanddown::Children => Handdown::Children,
            RawHanddown::Descendants => Handdown::Descendants,
        }
    }
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum RawTrackConf {
    No,
    #[default]
    Yes,
    Silent,
    Nohistory,
    YesNohistory,
}

impl From<RawTrackConf> for TrackConf {
    fn from(v: RawTrackConf) -> Self {
        match v {
            RawTrackConf::No => TrackConf::No,
            RawTrackConf::Yes => TrackConf::Yes,
            RawTrackConf::Silent => TrackConf::Silent,
            RawTrackConf::Nohistory => TrackConf::Nohistory,
            RawTrackConf::YesNohistory => TrackConf::YesNohistory,
        }
    }
}

#[derive(Deserialize, Default)]
struct RawHooks {
    #[serde(default)]
    prologue: Option<RawHookRef>,
    #[serde(default)]
    epilogue: Option<RawHookRef>,
    #[serde(default)]
    keepalive: Option<RawHookRef>,
    #[serde(default)]
    exception: Option<RawHookRef>,
    #[serde(default)]
    track_conf: Option<RawTrackConf>,
    #[serde(default)]
    track_conf_handdown: RawHanddown,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawItem {
    Script {
        name: String,
        executable: String,
        #[serde(default)]
        objective: String,
        #[serde(default)]
        reqs: Vec<RawRequirement>,
        #[serde(default)]
        args: Vec<RawVarArg>,
        #[serde(default = "one")]
        iterate: u64,
    },
    Session {
        name: String,
        #[serde(default)]
        vars: Vec<RawVarArg>,
        #[serde(default)]
        hooks: RawHooks,
        #[serde(default)]
        children: Vec<RawItem>,
        #[serde(default = "one")]
        iterate: u64,
    },
}

fn one() -> u64 {
    1
}

#[derive(Deserialize)]
struct RawPackage {
    name: String,
    root: RawItem,
}

fn build_item(arena: &mut RunItemArena, parent: Option<RunItemId>, raw: RawItem, is_service: bool) -> RunItemId {
    match raw {
        RawItem::Script { name, executable, objective, reqs, args, iterate } => {
            let kind = RunItemKind::Script(ScriptItem {
                executable,
                objective,
                reqs: reqs.into_iter().map(RawRequirement::into_core).collect(),
                args: args.into_iter().map(RawVarArg::into_core).collect(),
                iterate,
            });
            arena.insert(parent, Some(name), kind, is_service)
        }
        RawItem::Session { name, vars, hooks, children, iterate } => {
            let id = arena.insert(
                parent,
                Some(name),
                RunItemKind::Session(SessionItem {
                    vars: vars.into_iter().map(RawVarArg::into_core).collect(),
                    hooks: SessionHooks::default(),
                    children: Vec::new(),
                    iterate,
                }),
                is_service,
            );

            let resolve_hook = |arena: &mut RunItemArena, h: Option<RawHookRef>| -> Option<HookSlot> {
                h.map(|h| HookSlot {
                    item: build_item(arena, Some(id), *h.item, true),
                    handdown: h.handdown.into(),
                })
            };
            let prologue = resolve_hook(arena, hooks.prologue);
            let epilogue = resolve_hook(arena, hooks.epilogue);
            let keepalive = resolve_hook(arena, hooks.keepalive);
            let exception = resolve_hook(arena, hooks.exception);
            let track_conf = hooks.track_conf.map(|t| (t.into(), hooks.track_conf_handdown.into()));

            let child_ids: Vec<RunItemId> =
                children.into_iter().map(|c| build_item(arena, Some(id), c, false)).collect();

            if let RunItemKind::Session(s) = &mut arena.get_mut(id).kind {
                s.hooks = SessionHooks { prologue, epilogue, keepalive, exception, track_conf };
                s.children = child_ids;
            }
            id
        }
    }
}

pub struct JsonConfigSource {
    root: PathBuf,
}

impl JsonConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonConfigSource { root: root.into() }
    }

    fn package_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl ConfigSource for JsonConfigSource {
    fn load(&self, package: &str) -> Result<Config, IoError> {
        let path = self.package_path(package);
        if !path.exists() {
            return Err(IoError::PackageNotFound { name: package.to_string(), root: self.root.clone() });
        }
        let bytes = fs::read(&path).map_err(|source| IoError::Read { path: path.clone(), source })?;
        let raw: RawPackage =
            serde_json::from_slice(&bytes).map_err(|source| IoError::Malformed { path: path.clone(), source })?;

        let mut arena = RunItemArena::new();
        let root = build_item(&mut arena, None, raw.root, false);
        let _ = raw.name;
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config)?;
        Ok(config)
    }

    fn package_names(&self) -> Result<Vec<String>, IoError> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|source| IoError::Read { path: self.root.clone(), source })?;
        for entry in entries {
            let entry = entry.map_err(|source| IoError::Read { path: self.root.clone(), source })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_script_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(
            &path,
            r#"{
                "name": "suite",
                "root": {
                    "kind": "session",
                    "name": "root",
                    "vars": [{"name": "x", "values": [{"value": "a"}, {"value": "b"}]}],
                    "children": [
                        {"kind": "script", "name": "p", "executable": "p"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let source = JsonConfigSource::new(dir.path());
        let config = source.load("suite").unwrap();
        assert_eq!(config.total_iters, 2);
    }

    #[test]
    fn missing_package_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonConfigSource::new(dir.path());
        assert!(matches!(source.load("nope"), Err(IoError::PackageNotFound { .. })));
    }
}
