//! Shared JSON fixtures: controller graphs, avatar scenes with their material
//! stores, and build configurations. Everything is indexed by
//! `fixtures/manifest.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    graphs: BTreeMap<String, String>,
    scenes: BTreeMap<String, SceneEntry>,
    #[serde(default)]
    configs: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Deserialize)]
struct SceneEntry {
    scene: String,
    #[serde(default)]
    materials: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigEntry {
    Path(String),
    Detailed { path: String },
}

/// One kind of file a manifest entry can point at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Asset {
    Graph,
    Scene,
    Materials,
    Config,
}

impl Asset {
    const ALL: [Asset; 4] = [Asset::Graph, Asset::Scene, Asset::Materials, Asset::Config];

    fn label(self) -> &'static str {
        match self {
            Asset::Graph => "graph",
            Asset::Scene => "scene",
            Asset::Materials => "materials",
            Asset::Config => "config",
        }
    }

    fn names(self) -> Vec<&'static str> {
        let m = &*MANIFEST;
        match self {
            Asset::Graph => m.graphs.keys().map(String::as_str).collect(),
            Asset::Scene | Asset::Materials => m.scenes.keys().map(String::as_str).collect(),
            Asset::Config => m.configs.keys().map(String::as_str).collect(),
        }
    }

    /// Relative path of `name`. `Ok(None)` when a scene carries no material store.
    fn locate(self, name: &str) -> Result<Option<&'static str>> {
        let m = &*MANIFEST;
        let unknown = || anyhow!("unknown {} fixture '{name}'", self.label());
        let rel = match self {
            Asset::Graph => Some(m.graphs.get(name).ok_or_else(unknown)?.as_str()),
            Asset::Scene => Some(m.scenes.get(name).ok_or_else(unknown)?.scene.as_str()),
            Asset::Materials => m.scenes.get(name).ok_or_else(unknown)?.materials.as_deref(),
            Asset::Config => match m.configs.get(name).ok_or_else(unknown)? {
                ConfigEntry::Path(path) | ConfigEntry::Detailed { path } => Some(path.as_str()),
            },
        };
        Ok(rel)
    }

    fn require(self, name: &str) -> Result<&'static str> {
        self.locate(name)?
            .ok_or_else(|| anyhow!("{} fixture '{name}' has no {}", Asset::Scene.label(), self.label()))
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn read(asset: Asset, rel: &str) -> Result<String> {
    let path = fixtures_root().join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read {} fixture at {}", asset.label(), path.display()))
}

fn parse<T: DeserializeOwned>(asset: Asset, rel: &str) -> Result<T> {
    let text = read(asset, rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {} fixture {rel}", asset.label()))
}

/// Manifest entries whose file is missing on disk.
pub fn missing_files() -> Vec<PathBuf> {
    let root = fixtures_root();
    Asset::ALL
        .iter()
        .flat_map(|&asset| asset.names().into_iter().map(move |name| (asset, name)))
        .filter_map(|(asset, name)| asset.locate(name).ok().flatten())
        .map(|rel| root.join(rel))
        .filter(|path| !path.is_file())
        .collect()
}

/// Controller graphs in host JSON form.
pub mod graphs {
    use super::*;

    pub fn keys() -> Vec<String> {
        Asset::Graph.names().into_iter().map(str::to_string).collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read(Asset::Graph, Asset::Graph.require(name)?)
    }
}

/// Avatar hierarchies, each optionally paired with a material store.
pub mod scenes {
    use super::*;

    pub fn scene_json(name: &str) -> Result<String> {
        read(Asset::Scene, Asset::Scene.require(name)?)
    }

    pub fn materials<T: DeserializeOwned>(name: &str) -> Result<Option<T>> {
        match Asset::Materials.locate(name)? {
            Some(rel) => parse(Asset::Materials, rel).map(Some),
            None => Ok(None),
        }
    }
}

/// Build configurations.
pub mod configs {
    use super::*;

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        parse(Asset::Config, Asset::Config.require(name)?)
    }
}
