//! Incremental query cache
//! One node per typed character remembering which items still matched at that prefix

/// Item subsets remembered for one query prefix.
///
/// Entries are indices into the item collection. `None` means "not computed",
/// which makes the next keystroke fall back to the full collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSubsets {
    /// Items whose name matched, in score order
    pub by_name: Option<Vec<usize>>,
    /// Items whose path matched, in score order (only when path search ran)
    pub by_path: Option<Vec<usize>>,
}

/// One typed character of the current query
#[derive(Debug)]
pub struct CacheNode {
    character: char,
    next: Option<Box<CacheNode>>,
    subsets: CandidateSubsets,
}

impl CacheNode {
    fn new(character: char) -> Self {
        Self {
            character,
            next: None,
            subsets: CandidateSubsets::default(),
        }
    }

    /// Reuse this node for a different character, dropping everything after it
    fn reset(&mut self, character: char) {
        self.character = character;
        self.next = None;
        self.subsets = CandidateSubsets::default();
    }

    pub fn character(&self) -> char {
        self.character
    }

    pub fn subsets(&self) -> &CandidateSubsets {
        &self.subsets
    }
}

/// The node chain for the query currently being typed
#[derive(Debug, Default)]
pub struct QueryCache {
    root: Option<Box<CacheNode>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the whole chain (query cleared or item collection replaced)
    pub fn clear(&mut self) {
        self.root = None;
    }

    /// Bring the chain in line with `query`, one node per character.
    ///
    /// Nodes whose character differs from the query are reinitialised, which cuts
    /// off everything after them; missing nodes are appended. Returns the number
    /// of leading characters that hit an existing, unchanged node.
    pub fn walk(&mut self, query: &[char]) -> usize {
        let mut valid = 0;
        let mut intact = true;
        let mut slot = &mut self.root;

        for &ch in query {
            let mut appended = false;
            let node = slot.get_or_insert_with(|| {
                appended = true;
                Box::new(CacheNode::new(ch))
            });

            if appended {
                intact = false;
            } else if node.character != ch {
                node.reset(ch);
                intact = false;
            } else if intact {
                valid += 1;
            }

            slot = &mut node.next;
        }

        valid
    }

    /// Subsets cached at the last still-valid node, given the depth returned by `walk`
    pub fn seed(&self, valid_depth: usize) -> Option<&CandidateSubsets> {
        let depth = valid_depth.checked_sub(1)?;
        self.node(depth).map(|node| &node.subsets)
    }

    /// Record the results for the prefix of length `len`
    pub fn store(&mut self, len: usize, subsets: CandidateSubsets) {
        let Some(depth) = len.checked_sub(1) else { return };
        let mut node = self.root.as_deref_mut();
        for _ in 0..depth {
            node = node.and_then(|n| n.next.as_deref_mut());
        }
        if let Some(node) = node {
            node.subsets = subsets;
        }
    }

    /// Number of nodes in the chain
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            depth += 1;
            node = n.next.as_deref();
        }
        depth
    }

    fn node(&self, depth: usize) -> Option<&CacheNode> {
        let mut node = self.root.as_deref();
        for _ in 0..depth {
            node = node?.next.as_deref();
        }
        node
    }

    /// Characters along the chain, root first
    pub fn chain(&self) -> String {
        let mut out = String::new();
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            out.push(n.character);
            node = n.next.as_deref();
        }
        out
    }
}
