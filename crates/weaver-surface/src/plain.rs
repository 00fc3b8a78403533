//! Plain-text input over `TextContent`.
//!
//! A minimal `InputDelegate` so a surface is usable without a host-side
//! command layer: typing, line breaks, deletion, plain-text paste and drop,
//! copy/cut and IME commits. Rich-text hosts supply their own delegate.

use std::rc::Rc;

use smol_str::{SmolStr, format_smolstr};

use crate::event::EditorEvent;
use crate::platform::{InputDelegate, InputResponse};
use crate::state::{EditorState, SelectionState, TextBlock, TextContent};

/// A position inside a keyed block, as (block index, char offset).
type Point = (usize, usize);

fn text_content(state: &EditorState) -> Option<&TextContent> {
    state.content().as_any().downcast_ref::<TextContent>()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn point(content: &TextContent, key: &str, offset: usize) -> Option<Point> {
    let index = content.blocks().iter().position(|b| b.key == key)?;
    let len = char_len(&content.blocks()[index].text);
    Some((index, offset.min(len)))
}

/// Selection endpoints in document order.
fn ordered(content: &TextContent, selection: &SelectionState) -> Option<(Point, Point)> {
    let anchor = point(content, &selection.anchor_key, selection.anchor_offset)?;
    let focus = point(content, &selection.focus_key, selection.focus_offset)?;
    Some(if focus < anchor {
        (focus, anchor)
    } else {
        (anchor, focus)
    })
}

/// Next unused `b<n>` key.
fn next_key(blocks: &[TextBlock], taken: usize) -> SmolStr {
    let max = blocks
        .iter()
        .filter_map(|b| b.key.strip_prefix('b')?.parse::<usize>().ok())
        .max()
        .map_or(0, |n| n + 1);
    format_smolstr!("b{}", max + taken)
}

/// Replace `start..end` with `insert`, which may contain newlines.
///
/// Returns the new content and a caret after the inserted text.
pub fn splice(
    content: &TextContent,
    start: Point,
    end: Point,
    insert: &str,
) -> (TextContent, SelectionState) {
    let blocks = content.blocks();
    let (si, so) = start;
    let (ei, eo) = end;

    let prefix: String = blocks[si].text.chars().take(so).collect();
    let suffix: String = blocks[ei].text.chars().skip(eo).collect();

    let mut out: Vec<TextBlock> = blocks[..si].to_vec();
    let mut lines = insert.split('\n');
    let first = lines.next().unwrap_or_default();
    out.push(TextBlock {
        key: blocks[si].key.clone(),
        text: format!("{prefix}{first}"),
    });
    for (taken, line) in lines.enumerate() {
        out.push(TextBlock {
            key: next_key(blocks, taken),
            text: line.to_string(),
        });
    }

    let last = out.len() - 1;
    let caret_key = out[last].key.clone();
    let caret = char_len(&out[last].text);
    out[last].text.push_str(&suffix);
    out.extend(blocks[ei + 1..].iter().cloned());

    let selection = SelectionState::collapsed(caret_key, caret).with_has_focus(true);
    (TextContent::from_blocks(out), selection)
}

fn replace_selection(state: &EditorState, insert: &str) -> Option<EditorState> {
    let content = text_content(state)?;
    let (start, end) = ordered(content, state.selection())?;
    let (next, selection) = splice(content, start, end, insert);
    Some(state.push_content(Rc::new(next), selection))
}

/// Delete the selection, or one character either side of the caret.
fn delete(state: &EditorState, forward: bool) -> Option<EditorState> {
    let content = text_content(state)?;
    let (start, end) = ordered(content, state.selection())?;
    if start != end {
        return replace_selection(state, "");
    }

    let (index, offset) = start;
    let blocks = content.blocks();
    let range = if forward {
        if offset < char_len(&blocks[index].text) {
            (start, (index, offset + 1))
        } else if index + 1 < blocks.len() {
            (start, (index + 1, 0))
        } else {
            return None;
        }
    } else if offset > 0 {
        ((index, offset - 1), start)
    } else if index > 0 {
        ((index - 1, char_len(&blocks[index - 1].text)), start)
    } else {
        return None;
    };

    let (next, selection) = splice(content, range.0, range.1, "");
    Some(state.push_content(Rc::new(next), selection))
}

/// Whole document text, blocks joined with newlines.
pub fn document_text(state: &EditorState) -> Option<String> {
    let content = text_content(state)?;
    Some(
        content
            .blocks()
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Selected text, blocks joined with newlines.
pub fn selected_text(state: &EditorState) -> Option<String> {
    let content = text_content(state)?;
    let ((si, so), (ei, eo)) = ordered(content, state.selection())?;
    let blocks = content.blocks();
    if si == ei {
        return Some(
            blocks[si]
                .text
                .chars()
                .skip(so)
                .take(eo - so)
                .collect(),
        );
    }
    let mut text: String = blocks[si].text.chars().skip(so).collect();
    for block in &blocks[si + 1..ei] {
        text.push('\n');
        text.push_str(&block.text);
    }
    text.push('\n');
    text.extend(blocks[ei].text.chars().take(eo));
    Some(text)
}

fn commit_or_handled(next: Option<EditorState>) -> InputResponse {
    match next {
        Some(state) => InputResponse::Commit(state),
        None => InputResponse::Handled,
    }
}

/// `InputDelegate` for `TextContent` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextInput;

impl InputDelegate for PlainTextInput {
    fn before_input(&mut self, state: &EditorState, event: &EditorEvent) -> InputResponse {
        let Some(input_type) = event.input_type.as_deref() else {
            return InputResponse::PassThrough;
        };
        match input_type {
            "insertText" | "insertReplacementText" => match event.data.as_deref() {
                Some(data) => commit_or_handled(replace_selection(state, data)),
                None => InputResponse::PassThrough,
            },
            "insertLineBreak" | "insertParagraph" => {
                commit_or_handled(replace_selection(state, "\n"))
            }
            "deleteContentBackward" | "deleteWordBackward" | "deleteSoftLineBackward"
            | "deleteHardLineBackward" => commit_or_handled(delete(state, false)),
            "deleteContentForward" | "deleteWordForward" | "deleteSoftLineForward"
            | "deleteHardLineForward" => commit_or_handled(delete(state, true)),
            "deleteByCut" | "deleteContent" => commit_or_handled(replace_selection(state, "")),
            // The IME owns the DOM until the composition resolves.
            _ => InputResponse::PassThrough,
        }
    }

    fn paste(&mut self, state: &EditorState, event: &EditorEvent) -> InputResponse {
        match event.transfer_text.as_deref() {
            Some(text) => commit_or_handled(replace_selection(state, text)),
            None => InputResponse::Handled,
        }
    }

    /// External drops insert at the caret. Moving an internal selection
    /// needs a drop point, which plain text does not track.
    fn drop_payload(
        &mut self,
        state: &EditorState,
        event: &EditorEvent,
        internal: bool,
    ) -> InputResponse {
        if internal {
            return InputResponse::Handled;
        }
        match event.transfer_text.as_deref() {
            Some(text) => commit_or_handled(replace_selection(state, text)),
            None => InputResponse::Handled,
        }
    }

    fn copy_fragment(&mut self, state: &EditorState) -> Option<String> {
        selected_text(state)
    }

    fn remove_fragment(&mut self, state: &EditorState) -> Option<EditorState> {
        replace_selection(state, "")
    }

    fn commit_composition(&mut self, state: &EditorState, text: &str) -> Option<EditorState> {
        replace_selection(state, text)
    }
}
