//! Render graph construction and validation.
//!
//! The builder turns validated inputs (visual assets, narration, optional
//! music, captions) into an ordered [`RenderGraph`]. Nothing here touches
//! ffmpeg; the graph is pure data that `render::command` compiles into
//! arguments and a collaborator executes.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{MusicTrack, NarrationAudio, VisualAsset};

/// Errors from render graph construction.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No visual assets to render")]
    EmptyAssets,

    #[error("Visual asset not found on disk: {path}")]
    MissingAsset { path: String },

    #[error("Visual asset has non-positive duration ({duration_s}s): {path}")]
    InvalidDuration { path: String, duration_s: f64 },

    #[error(
        "Assembled visual duration {video_ms}ms does not match narration duration {narration_ms}ms"
    )]
    DurationMismatch { video_ms: u64, narration_ms: u64 },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Parameters controlling graph construction and encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Crossfade overlap between adjacent scenes, in milliseconds.
    pub crossfade_ms: u64,
    /// Output frame rate.
    pub fps: u32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Peak zoom factor for the motion effect (1.0 = no zoom).
    pub zoom_max_scale: f64,
    /// Zoom oscillations per clip (0.5 = one zoom-in over the clip).
    pub zoom_cycles: f64,
    /// Video encoder name.
    pub video_codec: String,
    /// Audio encoder name.
    pub audio_codec: String,
    /// Output pixel format.
    pub pixel_format: String,
    /// Allowed gap between assembled visual length and narration length.
    pub duration_tolerance_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            crossfade_ms: 1000,
            fps: 30,
            width: 1920,
            height: 1080,
            zoom_max_scale: 1.05,
            zoom_cycles: 0.5,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
            duration_tolerance_ms: 150,
        }
    }
}

/// Slow pan/zoom over a single still image.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionNode {
    pub asset: VisualAsset,
    pub max_scale: f64,
    pub cycles: f64,
}

/// Crossfade between two adjacent visual streams.
///
/// `offset_ms` is where the transition starts on the accumulated timeline
/// (previous stream length minus the overlap).
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeNode {
    pub duration_ms: u64,
    pub offset_ms: u64,
}

/// Narration track, optionally mixed with looped background music.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMixNode {
    pub narration: PathBuf,
    pub music: Option<MusicTrack>,
}

/// Burn a subtitle file into the assembled video.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBurnNode {
    pub captions: PathBuf,
}

/// One operation in the render graph.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Motion(MotionNode),
    Crossfade(CrossfadeNode),
    AudioMix(AudioMixNode),
    CaptionBurn(CaptionBurnNode),
}

/// Ordered render plan: nodes plus declared inputs and output parameters.
///
/// Node order is fixed: one motion node per asset, one crossfade per
/// adjacent pair, one audio mix, one caption burn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub narration: NarrationAudio,
    pub captions: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub output: PathBuf,
}

/// Builds a validated [`RenderGraph`] from pipeline outputs.
pub struct RenderGraphBuilder {
    config: RenderConfig,
}

impl RenderGraphBuilder {
    /// Create a builder with the given render configuration.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Validate inputs and build the graph.
    ///
    /// Checks that assets exist with positive durations and that the
    /// assembled visual length (crossfade overlap subtracted) agrees with
    /// the narration duration within the configured tolerance.
    ///
    /// Identical inputs always produce a structurally identical graph.
    pub fn build(
        &self,
        assets: &[VisualAsset],
        narration: &NarrationAudio,
        music: Option<&MusicTrack>,
        captions: &Path,
        output: &Path,
    ) -> RenderResult<RenderGraph> {
        if assets.is_empty() {
            return Err(RenderError::EmptyAssets);
        }

        for asset in assets {
            if !asset.path.exists() {
                return Err(RenderError::MissingAsset {
                    path: asset.path.display().to_string(),
                });
            }
            if asset.duration_s <= 0.0 {
                return Err(RenderError::InvalidDuration {
                    path: asset.path.display().to_string(),
                    duration_s: asset.duration_s,
                });
            }
        }

        let video_ms = self.assembled_duration_ms(assets);
        let narration_ms = narration.duration_ms;
        if video_ms.abs_diff(narration_ms) > self.config.duration_tolerance_ms {
            return Err(RenderError::DurationMismatch {
                video_ms,
                narration_ms,
            });
        }

        let mut nodes = Vec::with_capacity(assets.len() * 2 + 1);

        for asset in assets {
            nodes.push(RenderNode::Motion(MotionNode {
                asset: asset.clone(),
                max_scale: self.config.zoom_max_scale,
                cycles: self.config.zoom_cycles,
            }));
        }

        // Each transition starts where the previous stream ends minus the
        // overlap; the stream then grows by the next clip minus the overlap.
        let crossfade_ms = self.config.crossfade_ms;
        let mut running_ms = duration_ms(assets[0].duration_s);
        for asset in &assets[1..] {
            nodes.push(RenderNode::Crossfade(CrossfadeNode {
                duration_ms: crossfade_ms,
                offset_ms: running_ms.saturating_sub(crossfade_ms),
            }));
            running_ms = (running_ms + duration_ms(asset.duration_s)).saturating_sub(crossfade_ms);
        }

        nodes.push(RenderNode::AudioMix(AudioMixNode {
            narration: narration.path.clone(),
            music: music.cloned(),
        }));

        nodes.push(RenderNode::CaptionBurn(CaptionBurnNode {
            captions: captions.to_path_buf(),
        }));

        Ok(RenderGraph {
            nodes,
            narration: narration.clone(),
            captions: captions.to_path_buf(),
            width: self.config.width,
            height: self.config.height,
            fps: self.config.fps,
            video_codec: self.config.video_codec.clone(),
            audio_codec: self.config.audio_codec.clone(),
            pixel_format: self.config.pixel_format.clone(),
            output: output.to_path_buf(),
        })
    }

    /// Visual length after crossfade overlap: sum of asset durations minus
    /// one overlap per adjacent pair.
    fn assembled_duration_ms(&self, assets: &[VisualAsset]) -> u64 {
        let total: u64 = assets.iter().map(|a| duration_ms(a.duration_s)).sum();
        let overlap = self.config.crossfade_ms * (assets.len() as u64 - 1);
        total.saturating_sub(overlap)
    }
}

fn duration_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn make_asset(dir: &Path, name: &str, duration_s: f64) -> VisualAsset {
        let path = dir.join(name);
        fs::write(&path, b"png").unwrap();
        VisualAsset::new(path, duration_s)
    }

    fn make_narration(duration_ms: u64) -> NarrationAudio {
        NarrationAudio {
            path: PathBuf::from("/run/audio/narration.wav"),
            duration_ms,
        }
    }

    fn test_config() -> RenderConfig {
        RenderConfig {
            crossfade_ms: 500,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn rejects_empty_asset_list() {
        let builder = RenderGraphBuilder::new(test_config());
        let err = builder
            .build(
                &[],
                &make_narration(5000),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyAssets));
    }

    #[test]
    fn rejects_missing_asset_file() {
        let dir = tempdir().unwrap();
        let assets = vec![VisualAsset::new(dir.path().join("nope.png"), 2.0)];

        let builder = RenderGraphBuilder::new(test_config());
        let err = builder
            .build(
                &assets,
                &make_narration(2000),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap_err();

        match err {
            RenderError::MissingAsset { path } => assert!(path.ends_with("nope.png")),
            other => panic!("expected MissingAsset, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_duration() {
        let dir = tempdir().unwrap();
        let assets = vec![make_asset(dir.path(), "scene_000.png", 0.0)];

        let builder = RenderGraphBuilder::new(test_config());
        let err = builder
            .build(
                &assets,
                &make_narration(2000),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap_err();

        assert!(matches!(err, RenderError::InvalidDuration { .. }));
    }

    #[test]
    fn duration_mismatch_carries_both_durations() {
        let dir = tempdir().unwrap();
        let assets = vec![
            make_asset(dir.path(), "scene_000.png", 2.0),
            make_asset(dir.path(), "scene_001.png", 3.0),
        ];

        // 2000 + 3000 - 500 overlap = 4500ms of visuals vs 6000ms narration
        let builder = RenderGraphBuilder::new(test_config());
        let err = builder
            .build(
                &assets,
                &make_narration(6000),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap_err();

        match err {
            RenderError::DurationMismatch {
                video_ms,
                narration_ms,
            } => {
                assert_eq!(video_ms, 4500);
                assert_eq!(narration_ms, 6000);
            }
            other => panic!("expected DurationMismatch, got {other:?}"),
        }
    }

    #[test]
    fn accepts_duration_within_tolerance() {
        let dir = tempdir().unwrap();
        let assets = vec![
            make_asset(dir.path(), "scene_000.png", 2.0),
            make_asset(dir.path(), "scene_001.png", 3.0),
        ];

        // 4500ms visuals vs 4600ms narration, tolerance 150ms
        let builder = RenderGraphBuilder::new(test_config());
        let graph = builder
            .build(
                &assets,
                &make_narration(4600),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();

        assert_eq!(graph.narration.duration_ms, 4600);
    }

    #[test]
    fn emits_nodes_in_pipeline_order() {
        let dir = tempdir().unwrap();
        let assets = vec![
            make_asset(dir.path(), "scene_000.png", 2.0),
            make_asset(dir.path(), "scene_001.png", 3.0),
            make_asset(dir.path(), "scene_002.png", 2.5),
        ];

        // 2000 + 3000 + 2500 - 2*500 = 6500ms
        let builder = RenderGraphBuilder::new(test_config());
        let graph = builder
            .build(
                &assets,
                &make_narration(6500),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();

        assert_eq!(graph.nodes.len(), 7); // 3 motion + 2 crossfade + mix + burn
        assert!(matches!(graph.nodes[0], RenderNode::Motion(_)));
        assert!(matches!(graph.nodes[1], RenderNode::Motion(_)));
        assert!(matches!(graph.nodes[2], RenderNode::Motion(_)));
        assert!(matches!(graph.nodes[5], RenderNode::AudioMix(_)));
        assert!(matches!(graph.nodes[6], RenderNode::CaptionBurn(_)));
    }

    #[test]
    fn crossfade_offsets_accumulate() {
        let dir = tempdir().unwrap();
        let assets = vec![
            make_asset(dir.path(), "scene_000.png", 2.0),
            make_asset(dir.path(), "scene_001.png", 3.0),
            make_asset(dir.path(), "scene_002.png", 2.5),
        ];

        let builder = RenderGraphBuilder::new(test_config());
        let graph = builder
            .build(
                &assets,
                &make_narration(6500),
                None,
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();

        let offsets: Vec<u64> = graph
            .nodes
            .iter()
            .filter_map(|node| match node {
                RenderNode::Crossfade(fade) => Some(fade.offset_ms),
                _ => None,
            })
            .collect();

        // First fade at 2.0s - 0.5s; second at (2.0 + 3.0 - 0.5)s - 0.5s
        assert_eq!(offsets, vec![1500, 4000]);
    }

    #[test]
    fn identical_inputs_build_identical_graphs() {
        let dir = tempdir().unwrap();
        let assets = vec![
            make_asset(dir.path(), "scene_000.png", 2.0),
            make_asset(dir.path(), "scene_001.png", 3.0),
        ];
        let narration = make_narration(4500);
        let music = MusicTrack {
            path: PathBuf::from("/music/calm.mp3"),
            volume: 0.15,
        };

        let builder = RenderGraphBuilder::new(test_config());
        let first = builder
            .build(
                &assets,
                &narration,
                Some(&music),
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();
        let second = builder
            .build(
                &assets,
                &narration,
                Some(&music),
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn music_rides_on_mix_node() {
        let dir = tempdir().unwrap();
        let assets = vec![make_asset(dir.path(), "scene_000.png", 4.5)];
        let music = MusicTrack {
            path: PathBuf::from("/music/calm.mp3"),
            volume: 0.2,
        };

        let builder = RenderGraphBuilder::new(test_config());
        let graph = builder
            .build(
                &assets,
                &make_narration(4500),
                Some(&music),
                Path::new("captions.ass"),
                Path::new("out.mp4"),
            )
            .unwrap();

        let mix = graph
            .nodes
            .iter()
            .find_map(|node| match node {
                RenderNode::AudioMix(mix) => Some(mix),
                _ => None,
            })
            .unwrap();
        assert_eq!(mix.music.as_ref().unwrap().volume, 0.2);
    }
}
