//! crates/nexskill_core/src/blocks.rs
//!
//! The content-block store: one ordered block sequence for a single owner
//! (a lesson or a quiz question). Every mutation yields the full updated
//! sequence for the owner to hand to its change callback - never a delta.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{BlockType, ContentBlock, MediaMetadata};

/// Direction of an adjacent-swap reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Owns one ordered `ContentBlock` sequence and keeps its `position` values
/// contiguous from zero across every mutation.
///
/// All operations are synchronous and infallible: ids are drawn from the
/// current sequence by the caller, so an unknown id is a silent no-op.
#[derive(Debug, Default, Clone)]
pub struct ContentBlockStore {
    blocks: Vec<ContentBlock>,
}

impl ContentBlockStore {
    /// An empty sequence.
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Wraps a sequence loaded from storage. Blocks are ordered by their
    /// stored rank and renumbered so positions are contiguous from zero.
    pub fn from_blocks(mut blocks: Vec<ContentBlock>) -> Self {
        blocks.sort_by_key(|b| b.position);
        renumber(&mut blocks);
        Self { blocks }
    }

    /// The current sequence, in order.
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Consumes the store, handing the sequence back to the owner.
    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }

    /// Replaces one block's primary payload. With a `block_id` the named
    /// block is updated; without one the first text block is updated, and if
    /// the sequence has no text block a new one is synthesized at position
    /// zero, shifting every existing block down by one rank.
    pub fn update_content(&mut self, content: &str, block_id: Option<Uuid>) -> &[ContentBlock] {
        match block_id {
            Some(id) => {
                if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
                    block.content = content.to_string();
                }
            }
            None => {
                if let Some(block) = self
                    .blocks
                    .iter_mut()
                    .find(|b| b.block_type == BlockType::Text)
                {
                    block.content = content.to_string();
                } else {
                    let mut block = ContentBlock::new(BlockType::Text, 0);
                    block.content = content.to_string();
                    self.blocks.insert(0, block);
                    renumber(&mut self.blocks);
                }
            }
        }
        &self.blocks
    }

    /// Appends a new block of the given kind at the end of the sequence.
    pub fn add_block(&mut self, block_type: BlockType) -> &[ContentBlock] {
        let block = ContentBlock::new(block_type, self.blocks.len());
        self.blocks.push(block);
        &self.blocks
    }

    /// Deletes a block and renumbers the remainder, preserving relative order.
    pub fn remove_block(&mut self, block_id: Uuid) -> &[ContentBlock] {
        self.blocks.retain(|b| b.id != block_id);
        renumber(&mut self.blocks);
        &self.blocks
    }

    /// Swaps a block with its immediate neighbor. Moving the first block up
    /// or the last block down is a no-op.
    pub fn move_block(&mut self, block_id: Uuid, direction: MoveDirection) -> &[ContentBlock] {
        let Some(index) = self.blocks.iter().position(|b| b.id == block_id) else {
            return &self.blocks;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.blocks.len() => index + 1,
            _ => return &self.blocks,
        };
        self.blocks.swap(index, target);
        renumber(&mut self.blocks);
        &self.blocks
    }

    /// Shallow-merges the given attribute entries into a block's bag.
    pub fn update_attributes(
        &mut self,
        block_id: Uuid,
        partial: Map<String, Value>,
    ) -> &[ContentBlock] {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) {
            for (key, value) in partial {
                block.attributes.insert(key, value);
            }
        }
        &self.blocks
    }

    /// Records a completed media upload: the block's payload becomes the
    /// asset URL and the full metadata lands in the attribute bag.
    pub fn set_media(&mut self, block_id: Uuid, metadata: MediaMetadata) -> &[ContentBlock] {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) {
            block.content = metadata.url.clone();
            block.attributes.insert(
                "media_metadata".to_string(),
                serde_json::to_value(&metadata).unwrap_or(Value::Null),
            );
        }
        &self.blocks
    }
}

/// Reassigns contiguous zero-based positions in current vector order.
pub(crate) fn renumber(blocks: &mut [ContentBlock]) {
    for (index, block) in blocks.iter_mut().enumerate() {
        block.position = index;
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(store: &ContentBlockStore) -> Vec<usize> {
        store.blocks().iter().map(|b| b.position).collect()
    }

    #[test]
    fn positions_stay_contiguous_across_mutations() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Text);
        store.add_block(BlockType::Heading);
        store.add_block(BlockType::Image);
        store.add_block(BlockType::Code);
        assert_eq!(positions(&store), vec![0, 1, 2, 3]);

        let second = store.blocks()[1].id;
        store.remove_block(second);
        assert_eq!(positions(&store), vec![0, 1, 2]);

        let last = store.blocks()[2].id;
        store.move_block(last, MoveDirection::Up);
        assert_eq!(positions(&store), vec![0, 1, 2]);
    }

    #[test]
    fn move_at_boundaries_is_a_no_op() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Text);
        store.add_block(BlockType::Heading);
        let before = store.blocks().to_vec();

        let first = before[0].id;
        let last = before[1].id;
        store.move_block(first, MoveDirection::Up);
        assert_eq!(store.blocks(), before.as_slice());
        store.move_block(last, MoveDirection::Down);
        assert_eq!(store.blocks(), before.as_slice());
    }

    #[test]
    fn move_swaps_with_the_adjacent_block() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Text);
        store.add_block(BlockType::Heading);
        store.add_block(BlockType::Code);
        let heading = store.blocks()[1].id;

        store.move_block(heading, MoveDirection::Down);
        assert_eq!(store.blocks()[2].id, heading);
        assert_eq!(store.blocks()[2].position, 2);

        store.move_block(heading, MoveDirection::Up);
        assert_eq!(store.blocks()[1].id, heading);
        assert_eq!(positions(&store), vec![0, 1, 2]);
    }

    #[test]
    fn untargeted_update_synthesizes_a_text_block_at_the_front() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Image);
        store.add_block(BlockType::Code);
        let image = store.blocks()[0].id;

        store.update_content("<p>intro</p>", None);
        assert_eq!(store.blocks().len(), 3);
        assert_eq!(store.blocks()[0].block_type, BlockType::Text);
        assert_eq!(store.blocks()[0].content, "<p>intro</p>");
        assert_eq!(store.blocks()[0].position, 0);
        // Existing blocks shift down by one rank.
        assert_eq!(store.blocks()[1].id, image);
        assert_eq!(positions(&store), vec![0, 1, 2]);
    }

    #[test]
    fn untargeted_update_prefers_the_first_text_block() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Heading);
        store.add_block(BlockType::Text);
        store.add_block(BlockType::Text);
        let first_text = store.blocks()[1].id;

        store.update_content("hello", None);
        assert_eq!(store.blocks().len(), 3);
        assert_eq!(store.blocks()[1].id, first_text);
        assert_eq!(store.blocks()[1].content, "hello");
        assert_eq!(store.blocks()[2].content, "");
    }

    #[test]
    fn targeted_update_is_idempotent() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Text);
        store.add_block(BlockType::Code);
        let code = store.blocks()[1].id;

        store.update_content("fn main() {}", Some(code));
        let once = store.blocks().to_vec();
        store.update_content("fn main() {}", Some(code));
        assert_eq!(store.blocks(), once.as_slice());
    }

    #[test]
    fn heading_blocks_default_to_level_two() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Heading);
        assert_eq!(
            store.blocks()[0].attributes.get("level"),
            Some(&Value::from(2))
        );
        store.add_block(BlockType::Text);
        assert!(store.blocks()[1].attributes.is_empty());
    }

    #[test]
    fn attribute_update_is_a_shallow_merge() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Heading);
        let heading = store.blocks()[0].id;

        let mut partial = Map::new();
        partial.insert("level".to_string(), Value::from(3));
        partial.insert("anchor".to_string(), Value::from("intro"));
        store.update_attributes(heading, partial);

        let attributes = &store.blocks()[0].attributes;
        assert_eq!(attributes.get("level"), Some(&Value::from(3)));
        assert_eq!(attributes.get("anchor"), Some(&Value::from("intro")));
    }

    #[test]
    fn set_media_updates_payload_and_metadata() {
        let mut store = ContentBlockStore::new();
        store.add_block(BlockType::Image);
        let image = store.blocks()[0].id;

        let metadata = MediaMetadata {
            url: "https://cdn.nexskill.io/a.png".to_string(),
            filename: Some("a.png".to_string()),
            mime_type: Some("image/png".to_string()),
            size_bytes: Some(2048),
        };
        store.set_media(image, metadata);

        let block = &store.blocks()[0];
        assert_eq!(block.content, "https://cdn.nexskill.io/a.png");
        let stored = block
            .attributes
            .get("media_metadata")
            .expect("metadata should be merged into the bag");
        assert_eq!(stored["filename"], "a.png");
    }

    #[test]
    fn from_blocks_orders_by_stored_rank() {
        let mut a = ContentBlock::new(BlockType::Text, 2);
        a.content = "last".to_string();
        let mut b = ContentBlock::new(BlockType::Text, 0);
        b.content = "first".to_string();
        let store = ContentBlockStore::from_blocks(vec![a, b]);
        assert_eq!(store.blocks()[0].content, "first");
        assert_eq!(positions(&store), vec![0, 1]);
    }
}
