//! Monte Carlo Tree Search (MCTS) with UCT selection and tree reuse.
//!
//! Each playout runs four phases on a private copy of the board:
//! - Select: descend from the root by maximum UCT value. Unvisited children
//!   score infinity, so every move is tried once before any is refined.
//! - Expand: a leaf gets one child per empty point on its first visit.
//! - Rollout: play policy moves to the end of the game, then undo them.
//! - Backpropagate: credit every node on the path, root first.
//!
//! Nodes live in an arena ([`SearchTree`]) and refer to each other by
//! [`NodeId`]. A child's `parent` is only used to walk back up for
//! backpropagation; ownership runs strictly downward.
//!
//! Wins are counted from Black's side only (`black_wins`): a Black win
//! credits 1, a draw [`DRAW_CREDIT`], a White win 0. White's wins are
//! `visits - black_wins`.

use std::collections::VecDeque;

use crate::board::{Board, Color, Point};
use crate::constants::{DRAW_CREDIT, EXPLORATION};
use crate::policy::PlayoutPolicy;

/// Index of a node in the [`SearchTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the MCTS search tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Move that led here (`None` at the root)
    pub mv: Option<Point>,
    /// Parent node, used only for backpropagation
    pub parent: Option<NodeId>,
    /// One child per legal move, in expansion order
    pub children: Vec<(Point, NodeId)>,
    /// Number of playouts through this node
    pub visits: u32,
    /// Win credit from Black's point of view
    pub black_wins: f64,
    /// Whether children have been generated
    pub expanded: bool,
}

impl Node {
    fn new(mv: Option<Point>, parent: Option<NodeId>) -> Self {
        Self {
            mv,
            parent,
            ..Self::default()
        }
    }

    /// Win credit for `color`.
    #[inline]
    pub fn wins(&self, color: Color) -> f64 {
        match color {
            Color::Black => self.black_wins,
            Color::White => self.visits as f64 - self.black_wins,
        }
    }

    /// Win rate for `color`, zero when unvisited.
    #[inline]
    pub fn winrate(&self, color: Color) -> f64 {
        if self.visits > 0 {
            self.wins(color) / self.visits as f64
        } else {
            0.0
        }
    }
}

/// UCT value of `child` for the player choosing at its parent.
#[inline]
pub fn uct_value(parent_visits: u32, child: &Node, color: Color, exploration: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let visits = child.visits as f64;
    child.winrate(color) + exploration * ((parent_visits as f64).ln() / visits).sqrt()
}

/// Arena-backed search tree.
#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// A tree holding a single unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Child reached by `mv`, if it exists.
    pub fn child(&self, id: NodeId, mv: Point) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .find(|&&(m, _)| m == mv)
            .map(|&(_, child)| child)
    }

    /// Add a child for every legal move of `color` not already present.
    pub fn expand(&mut self, id: NodeId, board: &Board, color: Color) {
        for pt in board.empty_points() {
            if !board.is_legal(pt, color) || self.child(id, pt).is_some() {
                continue;
            }
            let child = self.allocate(Node::new(Some(pt), Some(id)));
            self.get_mut(id).children.push((pt, child));
        }
        self.get_mut(id).expanded = true;
    }

    /// Child maximizing UCT for `color`. Ties go to the earliest child.
    pub fn select(&self, id: NodeId, exploration: f64, color: Color) -> Option<(Point, NodeId)> {
        let node = self.get(id);
        let mut best: Option<((Point, NodeId), f64)> = None;
        for &(mv, child) in &node.children {
            let value = uct_value(node.visits, self.get(child), color, exploration);
            if best.is_none_or(|(_, v)| value > v) {
                best = Some(((mv, child), value));
            }
        }
        best.map(|(choice, _)| choice)
    }

    /// Credit one playout to `leaf` and all of its ancestors, root first.
    pub fn backpropagate(&mut self, leaf: NodeId, black_credit: f64) {
        let mut path = vec![leaf];
        let mut current = leaf;
        while let Some(parent) = self.get(current).parent {
            path.push(parent);
            current = parent;
        }
        for id in path.into_iter().rev() {
            let node = self.get_mut(id);
            node.visits += 1;
            node.black_wins += black_credit;
        }
    }

    /// Make `new_root` the root, dropping everything outside its subtree.
    ///
    /// Surviving nodes are compacted into a fresh arena in breadth-first
    /// order; their statistics are unchanged.
    pub fn reroot(&mut self, new_root: NodeId) {
        let mut old = std::mem::take(&mut self.nodes);
        let mut queue = VecDeque::from([(new_root, None)]);
        while let Some((old_id, parent)) = queue.pop_front() {
            let new_id = NodeId::from_index(self.nodes.len());
            let mut node = std::mem::take(&mut old[old_id.index()]);
            node.parent = parent;
            for (_, child) in node.children.iter_mut() {
                let next = NodeId::from_index(new_id.index() + 1 + queue.len());
                queue.push_back((*child, Some(new_id)));
                *child = next;
            }
            self.nodes.push(node);
        }
        self.root = NodeId(0);
    }
}

/// Statistics for one root move, as reported by [`Mcts::root_stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStats {
    pub mv: Point,
    pub visits: u32,
    pub wins: f64,
    pub winrate: f64,
}

/// MCTS player that keeps its tree between moves of a game.
pub struct Mcts {
    tree: SearchTree,
    to_play: Color,
    exploration: f64,
    policy: PlayoutPolicy,
    rng: fastrand::Rng,
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new(PlayoutPolicy::default())
    }
}

impl Mcts {
    pub fn new(policy: PlayoutPolicy) -> Self {
        Self::with_rng(policy, fastrand::Rng::new())
    }

    /// Deterministic engine for reproducible searches.
    pub fn with_seed(policy: PlayoutPolicy, seed: u64) -> Self {
        Self::with_rng(policy, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(policy: PlayoutPolicy, rng: fastrand::Rng) -> Self {
        Self {
            tree: SearchTree::new(),
            to_play: Color::Black,
            exploration: EXPLORATION,
            policy,
            rng,
        }
    }

    #[inline]
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Color the current root is built for.
    #[inline]
    pub fn to_play(&self) -> Color {
        self.to_play
    }

    pub fn policy(&self) -> PlayoutPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PlayoutPolicy) {
        self.policy = policy;
    }

    /// Throw the tree away and start over with `to_play` at the root.
    pub fn reset(&mut self, to_play: Color) {
        self.tree = SearchTree::new();
        self.to_play = to_play;
    }

    /// Run `simulations` playouts from `board` and return the most visited move.
    ///
    /// Returns `None` when no root move has been visited (e.g. zero
    /// simulations on a fresh tree, or the game is already over).
    pub fn get_move(
        &mut self,
        board: &Board,
        to_play: Color,
        simulations: usize,
        exploration: f64,
    ) -> Option<Point> {
        if self.to_play != to_play {
            log::debug!("discarding search tree built for {}, {to_play} to play", self.to_play);
            self.reset(to_play);
        }
        self.exploration = exploration;

        for _ in 0..simulations {
            let mut copy = board.clone();
            copy.set_current_player(to_play);
            self.playout(&mut copy, to_play);
        }

        let best = self.best_move();
        if log::log_enabled!(log::Level::Debug) {
            self.dump_children(board);
        }
        best
    }

    /// Advance the root past `mv`, keeping that child's subtree.
    ///
    /// If `mv` was never expanded the tree starts over. The side to play
    /// flips either way.
    pub fn update_with_move(&mut self, mv: Point) {
        match self.tree.child(self.tree.root(), mv) {
            Some(child) => self.tree.reroot(child),
            None => self.tree = SearchTree::new(),
        }
        self.to_play = self.to_play.opponent();
    }

    /// Root moves sorted by visit count, best first.
    pub fn root_stats(&self) -> Vec<MoveStats> {
        let root = self.tree.get(self.tree.root());
        let mut stats: Vec<MoveStats> = root
            .children
            .iter()
            .map(|&(mv, id)| {
                let child = self.tree.get(id);
                MoveStats {
                    mv,
                    visits: child.visits,
                    wins: child.wins(self.to_play),
                    winrate: child.winrate(self.to_play),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.visits.cmp(&a.visits));
        stats
    }

    fn best_move(&self) -> Option<Point> {
        let root = self.tree.get(self.tree.root());
        let mut best: Option<(Point, u32)> = None;
        for &(mv, id) in &root.children {
            let visits = self.tree.get(id).visits;
            if visits > 0 && best.is_none_or(|(_, v)| visits > v) {
                best = Some((mv, visits));
            }
        }
        best.map(|(mv, _)| mv)
    }

    fn playout(&mut self, board: &mut Board, mut color: Color) {
        let mut node = self.tree.root();
        if !self.tree.get(node).expanded && !is_over(board) {
            self.tree.expand(node, board, color);
        }

        while let Some((mv, child)) = self.tree.select(node, self.exploration, color) {
            if let Err(err) = board.play_move(mv, color) {
                log::error!("tree move {} rejected: {err}", board.format_point(mv));
                return;
            }
            color = color.opponent();
            node = child;
        }

        if !self.tree.get(node).expanded && !is_over(board) {
            self.tree.expand(node, board, color);
        }

        let credit = self.rollout(board);
        self.tree.backpropagate(node, credit);
    }

    /// Play policy moves to the end of the game and return Black's credit.
    ///
    /// The board is restored to its starting state before returning.
    fn rollout(&mut self, board: &mut Board) -> f64 {
        let mut played = 0;
        let winner = loop {
            if let Some(winner) = board.last_move_winner() {
                break Some(winner);
            }
            if board.is_full() {
                break None;
            }
            let color = board.current_player();
            let (_, candidates) = self.policy.candidate_moves(board, color);
            let Some(&mv) = self.rng.choice(candidates.iter()) else {
                break None;
            };
            if board.play_move(mv, color).is_err() {
                break None;
            }
            played += 1;
        };
        for _ in 0..played {
            board.undo_move();
        }

        match winner {
            Some(Color::Black) => 1.0,
            Some(Color::White) => 0.0,
            None => DRAW_CREDIT,
        }
    }

    /// Log the root children, most visited first.
    pub fn dump_children(&self, board: &Board) {
        let root = self.tree.get(self.tree.root());
        log::debug!(
            "root: {} visits, {} children, {} nodes",
            root.visits,
            root.children.len(),
            self.tree.len()
        );
        for stats in self.root_stats().iter().take(10) {
            log::debug!(
                "move {} v={} w={:.1} wr={:.3}",
                board.format_point(stats.mv),
                stats.visits,
                stats.wins,
                stats.winrate
            );
        }
    }
}

#[inline]
fn is_over(board: &Board) -> bool {
    board.last_move_made_five() || board.is_full()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visited(visits: u32, black_wins: f64) -> Node {
        Node {
            visits,
            black_wins,
            ..Node::default()
        }
    }

    #[test]
    fn test_uct_unvisited_is_infinite() {
        let child = Node::default();
        assert_eq!(uct_value(10, &child, Color::Black, EXPLORATION), f64::INFINITY);
    }

    #[test]
    fn test_uct_polarity() {
        let child = visited(10, 8.0);
        let black = uct_value(20, &child, Color::Black, 0.0);
        let white = uct_value(20, &child, Color::White, 0.0);
        assert!((black - 0.8).abs() < 1e-9);
        assert!((white - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_select_prefers_unvisited() {
        let board = Board::new(5).unwrap();
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.expand(root, &board, Color::Black);
        assert_eq!(tree.get(root).children.len(), 25);

        // Every child but the last has been visited and won every time.
        let children = tree.get(root).children.clone();
        for &(_, id) in &children[..24] {
            *tree.get_mut(id) = Node {
                parent: Some(root),
                ..visited(5, 5.0)
            };
        }
        tree.get_mut(root).visits = 120;
        let (mv, id) = tree.select(root, EXPLORATION, Color::Black).unwrap();
        assert_eq!((mv, id), children[24]);
    }

    #[test]
    fn test_backpropagate_updates_path() {
        let board = Board::new(5).unwrap();
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.expand(root, &board, Color::Black);
        let (_, child) = tree.get(root).children[3];
        tree.backpropagate(child, 1.0);
        tree.backpropagate(child, 0.0);
        assert_eq!(tree.get(root).visits, 2);
        assert_eq!(tree.get(child).visits, 2);
        assert_eq!(tree.get(child).black_wins, 1.0);
        assert_eq!(tree.get(child).wins(Color::White), 1.0);
    }

    #[test]
    fn test_reroot_keeps_subtree() {
        let mut board = Board::new(5).unwrap();
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.expand(root, &board, Color::Black);
        let (mv, child) = tree.get(root).children[7];
        board.play_move(mv, Color::Black).unwrap();
        tree.expand(child, &board, Color::White);
        let (_, grandchild) = tree.get(child).children[0];
        tree.backpropagate(grandchild, 0.5);

        tree.reroot(child);
        let new_root = tree.get(tree.root());
        assert_eq!(new_root.parent, None);
        assert_eq!(new_root.mv, Some(mv));
        assert_eq!(new_root.visits, 1);
        assert_eq!(new_root.children.len(), 24);
        assert_eq!(tree.len(), 25);
        for &(_, id) in &new_root.children {
            assert_eq!(tree.get(id).parent, Some(tree.root()));
        }
        let first = new_root.children[0].1;
        assert_eq!(tree.get(first).visits, 1);
        assert_eq!(tree.get(first).black_wins, 0.5);
    }

    #[test]
    fn test_rollout_restores_board() {
        let mut board = Board::new(5).unwrap();
        board.play_move(board.point(3, 3), Color::Black).unwrap();
        let before = board.to_string();
        let mut mcts = Mcts::with_seed(PlayoutPolicy::Random, 7);
        for _ in 0..20 {
            let credit = mcts.rollout(&mut board);
            assert!(credit == 0.0 || credit == DRAW_CREDIT || credit == 1.0);
        }
        assert_eq!(board.to_string(), before);
        assert_eq!(board.stone_count(), 1);
        assert_eq!(board.current_player(), Color::White);
    }

    #[test]
    fn test_zero_simulations_returns_none() {
        let board = Board::new(7).unwrap();
        let mut mcts = Mcts::with_seed(PlayoutPolicy::Random, 1);
        assert_eq!(mcts.get_move(&board, Color::Black, 0, EXPLORATION), None);
    }

    #[test]
    fn test_every_root_move_tried_once() {
        let board = Board::new(5).unwrap();
        let mut mcts = Mcts::with_seed(PlayoutPolicy::Random, 3);
        mcts.get_move(&board, Color::Black, 25, EXPLORATION);
        let root = mcts.tree().get(mcts.tree().root());
        assert_eq!(root.visits, 25);
        for &(_, id) in &root.children {
            assert_eq!(mcts.tree().get(id).visits, 1);
        }
    }

    #[test]
    fn test_color_change_discards_tree() {
        let board = Board::new(5).unwrap();
        let mut mcts = Mcts::with_seed(PlayoutPolicy::Random, 5);
        mcts.get_move(&board, Color::Black, 30, EXPLORATION);
        assert!(mcts.tree().len() > 1);
        mcts.get_move(&board, Color::White, 0, EXPLORATION);
        assert_eq!(mcts.tree().len(), 1);
        assert_eq!(mcts.to_play(), Color::White);
    }
}
