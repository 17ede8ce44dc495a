//! ASS subtitle writer.
//!
//! Writes caption lines to Advanced SubStation Alpha format with separate
//! `Default` (body) and `Heading` styles.
//!
//! # Timestamps
//!
//! ASS uses centisecond timing (H:MM:SS.cs, hours unpadded). Millisecond
//! inputs are truncated to centiseconds at write time.

use serde::{Deserialize, Serialize};

use crate::models::{CaptionLine, StyleTag};

/// Style parameters for the generated subtitle file.
///
/// Colours are ASS `&HAABBGGRR` strings; alignment uses numpad layout
/// (2 = bottom center, 5 = middle center).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssStyles {
    /// Script play resolution width.
    pub play_res_x: u32,
    /// Script play resolution height.
    pub play_res_y: u32,
    /// Font for both styles.
    pub font_name: String,
    /// Body font size.
    pub font_size: u32,
    /// Body text colour.
    pub primary_colour: String,
    /// Outline colour for both styles.
    pub outline_colour: String,
    /// Body box colour.
    pub back_colour: String,
    /// Body alignment.
    pub alignment: u32,
    /// Heading font size.
    pub heading_font_size: u32,
    /// Heading text colour.
    pub heading_primary_colour: String,
    /// Heading box colour.
    pub heading_back_colour: String,
    /// Heading alignment.
    pub heading_alignment: u32,
}

impl Default for AssStyles {
    fn default() -> Self {
        Self {
            play_res_x: 1920,
            play_res_y: 1080,
            font_name: "Arial".to_string(),
            font_size: 72,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            back_colour: "&H99000000".to_string(),
            alignment: 2,
            heading_font_size: 86,
            heading_primary_colour: "&H00FFFF00".to_string(),
            heading_back_colour: "&H60000000".to_string(),
            heading_alignment: 5,
        }
    }
}

/// Write caption lines to an ASS file string.
///
/// Dialogue entries are emitted sorted by start time; heading lines use
/// the `Heading` style and render their original script text.
pub fn write_ass(lines: &[CaptionLine], styles: &AssStyles) -> String {
    let mut output = format_header(styles);

    let mut ordered: Vec<&CaptionLine> = lines.iter().collect();
    ordered.sort_by_key(|l| l.start_ms);

    for line in ordered {
        let style = match line.style_tag {
            StyleTag::Body => "Default",
            StyleTag::Heading => "Heading",
        };
        let text = line.display_text().replace('\n', "\\N");
        output.push_str(&format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}\n",
            format_ass_time(line.start_ms),
            format_ass_time(line.end_ms),
            style,
            text
        ));
    }

    output
}

fn format_header(styles: &AssStyles) -> String {
    let default_style = format!(
        "Style: Default,{},{},{},&H000000FF,{},{},-1,0,0,0,100,100,0,0,1,2,1,{},10,10,20,1",
        styles.font_name,
        styles.font_size,
        styles.primary_colour,
        styles.outline_colour,
        styles.back_colour,
        styles.alignment
    );
    let heading_style = format!(
        "Style: Heading,{},{},{},&H000000FF,{},{},-1,0,0,0,100,100,0,0,1,2,1,{},30,30,50,1",
        styles.font_name,
        styles.heading_font_size,
        styles.heading_primary_colour,
        styles.outline_colour,
        styles.heading_back_colour,
        styles.heading_alignment
    );

    format!(
        "[Script Info]\n\
         Title: StoryReel Captions\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         PlayResX: {}\n\
         PlayResY: {}\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         {}\n\
         {}\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        styles.play_res_x, styles.play_res_y, default_style, heading_style
    )
}

/// Format milliseconds as an ASS timestamp (H:MM:SS.cs).
pub fn format_ass_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WordTimestamp;

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0), "0:00:00.00");
        assert_eq!(format_ass_time(1000), "0:00:01.00");
        assert_eq!(format_ass_time(61_230), "0:01:01.23");
        assert_eq!(format_ass_time(3_600_000), "1:00:00.00");
        // Sub-centisecond precision truncates.
        assert_eq!(format_ass_time(1_239), "0:00:01.23");
    }

    #[test]
    fn header_declares_both_styles() {
        let output = write_ass(&[], &AssStyles::default());
        assert!(output.starts_with("[Script Info]\nTitle: StoryReel Captions\n"));
        assert!(output.contains("PlayResX: 1920\n"));
        assert!(output.contains(
            "Style: Default,Arial,72,&H00FFFFFF,&H000000FF,&H00000000,&H99000000,-1,0,0,0,100,100,0,0,1,2,1,2,10,10,20,1\n"
        ));
        assert!(output.contains(
            "Style: Heading,Arial,86,&H00FFFF00,&H000000FF,&H00000000,&H60000000,-1,0,0,0,100,100,0,0,1,2,1,5,30,30,50,1\n"
        ));
    }

    #[test]
    fn writes_dialogue_sorted_by_start() {
        let late = CaptionLine::body(vec![WordTimestamp::new("late", 5000, 5600)]);
        let early = CaptionLine::heading(
            vec![WordTimestamp::new("intro", 1000, 1800)],
            "The Intro",
        );
        let output = write_ass(&[late, early], &AssStyles::default());

        let heading_entry = "Dialogue: 0,0:00:01.00,0:00:01.80,Heading,,0,0,0,,The Intro";
        let body_entry = "Dialogue: 0,0:00:05.00,0:00:05.60,Default,,0,0,0,,late";
        let heading_pos = output.find(heading_entry).unwrap();
        let body_pos = output.find(body_entry).unwrap();
        assert!(heading_pos < body_pos);
    }

    #[test]
    fn heading_newlines_escape() {
        let line = CaptionLine::heading(
            vec![WordTimestamp::new("two", 0, 500)],
            "Line one\nLine two",
        );
        let output = write_ass(&[line], &AssStyles::default());
        assert!(output.contains(",,0,0,0,,Line one\\NLine two\n"));
    }
}
