// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour hierarchy over imageproc's border following
//!
//! imageproc reports each contour with a parent index only. Segmentation needs
//! to walk children, so the parent links are turned into first-child and
//! next-sibling links here.

use crate::types::Point2D;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// One traced border with its hierarchy links
#[derive(Debug, Clone)]
pub struct ContourNode {
    pub points: Vec<Point2D>,
    pub is_hole: bool,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub next_sibling: Option<usize>,
}

impl ContourNode {
    /// Polygon area using the shoelace formula
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Pixel bounding rectangle as `(x, y, width, height)`, inclusive of the
    /// border pixels
    pub fn bounding_rect(&self) -> Option<(u32, u32, u32, u32)> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((
            min_x as u32,
            min_y as u32,
            (max_x - min_x) as u32 + 1,
            (max_y - min_y) as u32 + 1,
        ))
    }
}

/// All contours of a mask with navigable hierarchy
#[derive(Debug, Clone, Default)]
pub struct ContourTree {
    pub nodes: Vec<ContourNode>,
}

impl ContourTree {
    /// Trace every foreground border in `mask` (non-zero pixels are foreground)
    pub fn from_mask(mask: &GrayImage) -> Self {
        let contours = find_contours::<u32>(mask);
        let raw = contours
            .into_iter()
            .map(|c| {
                let points = c
                    .points
                    .iter()
                    .map(|p| Point2D::new(p.x as f64, p.y as f64))
                    .collect();
                (points, c.border_type == BorderType::Hole, c.parent)
            })
            .collect();
        Self::from_parent_links(raw)
    }

    /// Build the tree from `(points, is_hole, parent)` triples
    pub fn from_parent_links(raw: Vec<(Vec<Point2D>, bool, Option<usize>)>) -> Self {
        let mut nodes: Vec<ContourNode> = raw
            .into_iter()
            .map(|(points, is_hole, parent)| ContourNode {
                points,
                is_hole,
                parent,
                first_child: None,
                next_sibling: None,
            })
            .collect();

        // Link in reverse so each child list keeps extraction order
        for i in (0..nodes.len()).rev() {
            if let Some(parent) = nodes[i].parent {
                if parent >= nodes.len() || parent == i {
                    nodes[i].parent = None;
                    continue;
                }
                nodes[i].next_sibling = nodes[parent].first_child;
                nodes[parent].first_child = Some(i);
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of contour `index`
    pub fn children(&self, index: usize) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes.get(index).and_then(|n| n.first_child),
        }
    }
}

/// Iterator over sibling links
pub struct Children<'a> {
    tree: &'a ContourTree,
    next: Option<usize>,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.nodes[current].next_sibling;
        Some(current)
    }
}

/// Calculate polygon area using the shoelace formula
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    (area / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(x, y),
            Point2D::new(x + size, y),
            Point2D::new(x + size, y + size),
            Point2D::new(x, y + size),
        ]
    }

    #[test]
    fn test_polygon_area() {
        assert_relative_eq!(polygon_area(&square(0.0, 0.0, 10.0)), 100.0);
        assert_relative_eq!(polygon_area(&square(0.0, 0.0, 10.0)[..2]), 0.0);
    }

    #[test]
    fn test_children_follow_sibling_links() {
        let tree = ContourTree::from_parent_links(vec![
            (square(0.0, 0.0, 100.0), false, None),
            (square(10.0, 10.0, 10.0), true, Some(0)),
            (square(40.0, 10.0, 10.0), true, Some(0)),
            (square(12.0, 12.0, 2.0), false, Some(1)),
            (square(200.0, 0.0, 10.0), false, None),
        ]);

        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![3]);
        assert_eq!(tree.children(4).count(), 0);
        assert_eq!(tree.nodes[1].next_sibling, Some(2));
    }

    #[test]
    fn test_from_mask_finds_ring_and_hole() {
        let mut mask = GrayImage::new(60, 60);
        for i in 10..50 {
            for t in 0..3 {
                mask.put_pixel(i, 10 + t, Luma([255]));
                mask.put_pixel(i, 47 + t, Luma([255]));
                mask.put_pixel(10 + t, i, Luma([255]));
                mask.put_pixel(47 + t, i, Luma([255]));
            }
        }

        let tree = ContourTree::from_mask(&mask);
        assert_eq!(tree.len(), 2);

        let outer = tree.nodes.iter().position(|n| !n.is_hole).unwrap();
        let hole = tree.nodes.iter().position(|n| n.is_hole).unwrap();
        assert_eq!(tree.nodes[hole].parent, Some(outer));
        assert_eq!(tree.children(outer).collect::<Vec<_>>(), vec![hole]);

        assert_eq!(tree.nodes[outer].bounding_rect(), Some((10, 10, 40, 40)));
        assert!(tree.nodes[hole].area() < tree.nodes[outer].area());
    }
}
