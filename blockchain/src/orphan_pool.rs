use std::collections::HashMap;
use linked_hash_map::LinkedHashMap;
use primitives::hash::H256;
use chain::IndexedBlock;

/// Storage for blocks whose parents are not yet part of the stored chain.
///
/// Insertion order doubles as the eviction order: when the pool is full, the
/// least recently inserted block is dropped. A parent index is kept so a
/// newly connectable block pulls its pooled descendants along.
pub struct OrphanPool {
	/// hash -> block, insertion ordered
	blocks: LinkedHashMap<H256, IndexedBlock>,
	/// parent hash -> child hashes, insertion ordered
	by_parent: HashMap<H256, Vec<H256>>,
	capacity: usize,
}

impl OrphanPool {
	pub fn new(capacity: usize) -> Self {
		OrphanPool {
			blocks: LinkedHashMap::new(),
			by_parent: HashMap::new(),
			capacity: capacity,
		}
	}

	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.blocks.contains_key(hash)
	}

	pub fn get(&self, hash: &H256) -> Option<&IndexedBlock> {
		self.blocks.get(hash)
	}

	/// Inserts a block. Duplicates by hash are ignored; when the pool is
	/// full the least recently inserted block makes room.
	pub fn insert(&mut self, block: IndexedBlock) {
		if self.blocks.contains_key(&block.header.hash) {
			return;
		}

		if self.blocks.len() >= self.capacity {
			if let Some((evicted, _)) = self.blocks.pop_front() {
				trace!(target: "chain", "Evicting orphan block {}", evicted.to_reversed_str());
				self.unlink(&evicted);
			}
		}

		let hash = block.header.hash.clone();
		let parent = block.header.raw.previous_header_hash.clone();
		self.by_parent.entry(parent).or_insert_with(Vec::new).push(hash.clone());
		self.blocks.insert(hash, block);
	}

	/// The earliest inserted pooled child of the given block.
	pub fn first_child(&self, parent: &H256) -> Option<H256> {
		self.by_parent.get(parent)
			.and_then(|children| children.first())
			.cloned()
	}

	/// Hashes from the oldest pooled ancestor of `tip` up to `tip` itself,
	/// in parent-first order. The parent of the first element is not in the
	/// pool.
	pub fn chain_to(&self, tip: &H256) -> Vec<H256> {
		let mut chain = Vec::new();
		let mut current = tip.clone();

		while let Some(block) = self.blocks.get(&current) {
			chain.push(current.clone());
			current = block.header.raw.previous_header_hash.clone();
		}

		chain.reverse();
		chain
	}

	/// Removes and returns the chain ending at `tip`, parent first.
	pub fn take_chain_to(&mut self, tip: &H256) -> Vec<IndexedBlock> {
		self.chain_to(tip).into_iter()
			.filter_map(|hash| self.remove(&hash))
			.collect()
	}

	/// Removes a single block.
	pub fn remove(&mut self, hash: &H256) -> Option<IndexedBlock> {
		let block = self.blocks.remove(hash)?;
		self.unlink(hash);
		Some(block)
	}

	/// Removes a block and every pooled descendant of it. Returns the
	/// removed hashes.
	pub fn remove_subtree(&mut self, root: &H256) -> Vec<H256> {
		let mut removed = Vec::new();
		let mut queue = vec![root.clone()];

		while let Some(hash) = queue.pop() {
			if self.remove(&hash).is_some() {
				removed.push(hash.clone());
			}
			if let Some(children) = self.by_parent.get(&hash) {
				queue.extend(children.iter().cloned());
			}
		}

		removed
	}

	fn unlink(&mut self, hash: &H256) {
		for children in self.by_parent.values_mut() {
			children.retain(|child| child != hash);
		}
		self.by_parent.retain(|_, children| !children.is_empty());
	}
}
