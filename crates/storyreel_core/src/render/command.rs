//! ffmpeg command compiler.
//!
//! Compiles a [`RenderGraph`] into command-line tokens for a two-pass
//! render: pass one assembles stills, motion, crossfades, and the audio
//! mix into an intermediate video; pass two burns the caption track into
//! the final output. Nothing here runs ffmpeg; the render collaborator
//! executes the plan.

use std::path::{Path, PathBuf};

use crate::models::MusicTrack;

use super::graph::{CrossfadeNode, MotionNode, RenderGraph, RenderNode};

/// One ffmpeg invocation: argument tokens (program name excluded) and the
/// file the invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegInvocation {
    pub args: Vec<String>,
    pub output: PathBuf,
}

/// Two-pass render plan compiled from a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Pass 1: visuals + mixed audio into the intermediate video.
    pub assemble: FfmpegInvocation,
    /// Pass 2: captions burned into the final output.
    pub burn: FfmpegInvocation,
}

/// Compile a render graph into a two-pass plan.
///
/// `assembled` is where pass one writes the intermediate video; pass two
/// reads it and writes the graph's declared output.
pub fn compile(graph: &RenderGraph, assembled: &Path) -> RenderPlan {
    RenderPlan {
        assemble: FfmpegInvocation {
            args: assemble_args(graph, assembled),
            output: assembled.to_path_buf(),
        },
        burn: FfmpegInvocation {
            args: burn_args(graph, assembled),
            output: graph.output.clone(),
        },
    }
}

/// Pass 1 tokens: one looped-still input per motion node, the narration
/// input, an optional looped music input, the filter graph, stream maps,
/// and encoder options.
fn assemble_args(graph: &RenderGraph, assembled: &Path) -> Vec<String> {
    let motions = motion_nodes(graph);
    let music = music_track(graph);

    let mut args = vec!["-y".to_string()];

    for motion in &motions {
        args.push("-loop".to_string());
        args.push("1".to_string());
        args.push("-framerate".to_string());
        args.push(graph.fps.to_string());
        args.push("-t".to_string());
        args.push(fmt_secs(motion.asset.duration_s));
        args.push("-i".to_string());
        args.push(motion.asset.path.to_string_lossy().to_string());
    }

    let narration_index = motions.len();
    args.push("-i".to_string());
    args.push(graph.narration.path.to_string_lossy().to_string());

    if let Some(track) = music {
        // Music loops until the narration-driven mix ends.
        args.push("-stream_loop".to_string());
        args.push("-1".to_string());
        args.push("-i".to_string());
        args.push(track.path.to_string_lossy().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(build_filter_graph(graph, &motions, narration_index, music));

    args.push("-map".to_string());
    args.push(final_video_label(motions.len()));
    args.push("-map".to_string());
    if music.is_some() {
        args.push("[aout]".to_string());
    } else {
        args.push(format!("{narration_index}:a"));
    }

    args.push("-c:v".to_string());
    args.push(graph.video_codec.clone());
    args.push("-pix_fmt".to_string());
    args.push(graph.pixel_format.clone());
    args.push("-c:a".to_string());
    args.push(graph.audio_codec.clone());
    if music.is_some() {
        args.push("-b:a".to_string());
        args.push("192k".to_string());
    }
    args.push("-shortest".to_string());
    args.push(assembled.to_string_lossy().to_string());

    args
}

/// Pass 2 tokens: burn the caption file into the assembled video, copying
/// the audio stream untouched.
fn burn_args(graph: &RenderGraph, assembled: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        assembled.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("ass='{}'", escape_filter_path(&graph.captions)),
        "-c:a".to_string(),
        "copy".to_string(),
        graph.output.to_string_lossy().to_string(),
    ]
}

/// Build the `-filter_complex` graph string.
///
/// Per still: normalize (fps, scale, pad, reset timestamps) into `[baseN]`,
/// then cosine zoompan motion into `[vN]`. Adjacent streams chain through
/// `xfade` into `[xN]`. With music, narration and music mix into `[aout]`.
fn build_filter_graph(
    graph: &RenderGraph,
    motions: &[&MotionNode],
    narration_index: usize,
    music: Option<&MusicTrack>,
) -> String {
    let mut parts = Vec::new();
    let (w, h, fps) = (graph.width, graph.height, graph.fps);

    for (i, motion) in motions.iter().enumerate() {
        parts.push(format!(
            "[{i}:v]fps={fps},scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setpts=PTS-STARTPTS[base{i}]"
        ));

        let frames = clip_frames(motion.asset.duration_s, fps);
        parts.push(format!(
            "[base{i}]zoompan=z='{expr}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)'\
             :d={frames}:s={w}x{h}:fps={fps}[v{i}]",
            expr = zoom_expression(motion.max_scale, motion.cycles, frames),
        ));
    }

    let mut current = "[v0]".to_string();
    for (i, fade) in crossfade_nodes(graph).iter().enumerate() {
        let label = format!("[x{}]", i + 1);
        parts.push(format!(
            "{current}[v{next}]xfade=transition=fade:duration={dur}:offset={offset}{label}",
            next = i + 1,
            dur = fmt_secs(fade.duration_ms as f64 / 1000.0),
            offset = fmt_secs(fade.offset_ms as f64 / 1000.0),
        ));
        current = label;
    }

    if let Some(track) = music {
        parts.push(format!("[{narration_index}:a]volume=1[main]"));
        parts.push(format!(
            "[{}:a]volume={}[bg]",
            narration_index + 1,
            track.volume
        ));
        parts.push("[main][bg]amix=inputs=2:duration=first[aout]".to_string());
    }

    parts.join(";")
}

/// Cosine ease: zoom oscillates between 1.0 and `max_scale` over the clip,
/// `cycles` full oscillations per clip.
fn zoom_expression(max_scale: f64, cycles: f64, frames: u64) -> String {
    format!("1+({max_scale}-1)*(0.5-0.5*cos({cycles}*2*PI*on/{frames}))")
}

fn clip_frames(duration_s: f64, fps: u32) -> u64 {
    ((duration_s * f64::from(fps)).round() as u64).max(1)
}

fn final_video_label(clip_count: usize) -> String {
    if clip_count > 1 {
        format!("[x{}]", clip_count - 1)
    } else {
        "[v0]".to_string()
    }
}

fn motion_nodes(graph: &RenderGraph) -> Vec<&MotionNode> {
    graph
        .nodes
        .iter()
        .filter_map(|node| match node {
            RenderNode::Motion(motion) => Some(motion),
            _ => None,
        })
        .collect()
}

fn crossfade_nodes(graph: &RenderGraph) -> Vec<&CrossfadeNode> {
    graph
        .nodes
        .iter()
        .filter_map(|node| match node {
            RenderNode::Crossfade(fade) => Some(fade),
            _ => None,
        })
        .collect()
}

fn music_track(graph: &RenderGraph) -> Option<&MusicTrack> {
    graph.nodes.iter().find_map(|node| match node {
        RenderNode::AudioMix(mix) => mix.music.as_ref(),
        _ => None,
    })
}

/// Seconds formatted for ffmpeg expressions (shortest round-trip form).
fn fmt_secs(seconds: f64) -> String {
    format!("{seconds}")
}

/// ffmpeg filter arguments treat `\` and `:` specially; normalize
/// backslashes to forward slashes, then escape colons.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}
