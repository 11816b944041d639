use std::cmp::{self, Ordering};

use super::{Index, Keyed};

type Link<R> = Option<Box<Node<R>>>;

#[derive(Debug)]
pub(crate) struct Node<R> {
    pub(crate) record: R,
    pub(crate) left: Link<R>,
    pub(crate) right: Link<R>,
    /// 以该节点为根的子树高度，叶子为 1
    pub(crate) height: usize,
}

impl<R> Node<R> {
    fn new(record: R) -> Box<Self> {
        Box::new(Self {
            record,
            left: None,
            right: None,
            height: 1,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + cmp::max(height(&self.left), height(&self.right));
    }

    /// 平衡因子：左子树高度减右子树高度
    fn balance(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height<R>(link: &Link<R>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn balance<R>(link: &Link<R>) -> isize {
    link.as_ref().map_or(0, |n| n.balance())
}

/// 右旋：`y` 的左孩子 `x` 成为子树新根，`x` 原右子树挂到 `y` 的左侧
fn rotate_right<R>(mut y: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut x) = y.left.take() else {
        unreachable!("right rotation requires a left child");
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

/// 左旋，与右旋对称
fn rotate_left<R>(mut x: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut y) = x.right.take() else {
        unreachable!("left rotation requires a right child");
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// AVL 平衡二叉搜索树索引
#[derive(Debug)]
pub struct BalancedIndex<R> {
    pub(crate) root: Link<R>,
    len: usize,
}

impl<R> Default for BalancedIndex<R> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<R: Keyed> BalancedIndex<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        height(&self.root)
    }

    /// 递归插入并返回子树新根，`inserted` 标记是否真正插入
    fn insert_node(link: Link<R>, record: R, inserted: &mut bool) -> Box<Node<R>> {
        let Some(mut node) = link else {
            *inserted = true;
            return Node::new(record);
        };

        match record.key().cmp(node.record.key()) {
            Ordering::Less => {
                node.left = Some(Self::insert_node(node.left.take(), record, inserted));
            }
            Ordering::Greater => {
                node.right = Some(Self::insert_node(node.right.take(), record, inserted));
            }
            // 标识重复，保留已有记录
            Ordering::Equal => return node,
        }

        if !*inserted {
            return node;
        }
        Self::rebalance(node)
    }

    /// 重算高度，失衡时做一次单旋或双旋，返回子树新根
    ///
    /// 旋转方向由较高一侧孩子自身的平衡因子决定。插入后失衡时，新 key 所在的
    /// 孙子树必然更高，因此这与比较新 key 和孩子 key 的选择一致
    fn rebalance(mut node: Box<Node<R>>) -> Box<Node<R>> {
        node.update_height();
        let factor = node.balance();
        if factor > 1 {
            if balance(&node.left) < 0 {
                // 左右
                node.left = node.left.take().map(rotate_left);
            }
            // 左左
            return rotate_right(node);
        }
        if factor < -1 {
            if balance(&node.right) > 0 {
                // 右左
                node.right = node.right.take().map(rotate_right);
            }
            // 右右
            return rotate_left(node);
        }
        node
    }

    /// 递归删除并返回子树新根与被删除的记录
    fn delete_node(link: Link<R>, key: &R::Key) -> (Link<R>, Option<R>) {
        let Some(mut node) = link else {
            return (None, None);
        };

        let removed = match key.cmp(node.record.key()) {
            Ordering::Less => {
                let (left, removed) = Self::delete_node(node.left.take(), key);
                node.left = left;
                removed
            }
            Ordering::Greater => {
                let (right, removed) = Self::delete_node(node.right.take(), key);
                node.right = right;
                removed
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, None) => return (None, Some(node.record)),
                (Some(child), None) | (None, Some(child)) => return (Some(child), Some(node.record)),
                (Some(left), Some(right)) => {
                    // 用中序后继替换，再从右子树中移除后继
                    let (right, successor) = Self::take_min(right);
                    node.left = Some(left);
                    node.right = right;
                    Some(std::mem::replace(&mut node.record, successor))
                }
            },
        };

        if removed.is_none() {
            return (Some(node), None);
        }
        (Some(Self::rebalance(node)), removed)
    }

    /// 移除子树中的最小节点，返回子树新根与该节点的记录
    fn take_min(mut node: Box<Node<R>>) -> (Link<R>, R) {
        match node.left.take() {
            None => (node.right.take(), node.record),
            Some(left) => {
                let (left, min) = Self::take_min(left);
                node.left = left;
                (Some(Self::rebalance(node)), min)
            }
        }
    }
}

impl<R: Keyed> Index<R> for BalancedIndex<R> {
    fn insert(&mut self, record: R) {
        let mut inserted = false;
        let root = Self::insert_node(self.root.take(), record, &mut inserted);
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
    }

    fn search(&self, key: &R::Key) -> Option<&R> {
        let mut link = &self.root;
        while let Some(node) = link {
            match key.cmp(node.record.key()) {
                Ordering::Less => link = &node.left,
                Ordering::Greater => link = &node.right,
                Ordering::Equal => return Some(&node.record),
            }
        }
        None
    }

    fn delete(&mut self, key: &R::Key) -> bool {
        let (root, removed) = Self::delete_node(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
            return true;
        }
        false
    }

    fn traverse(&self) -> Vec<&R> {
        fn walk<'a, R>(link: &'a Link<R>, out: &mut Vec<&'a R>) {
            if let Some(node) = link {
                walk(&node.left, out);
                out.push(&node.record);
                walk(&node.right, out);
            }
        }

        let mut out = Vec::with_capacity(self.len);
        walk(&self.root, &mut out);
        out
    }

    fn len(&self) -> usize {
        self.len
    }
}
