// Copyright (c) 2026 the velarain authors

// Level 0 is a freshly stamped head; a cell at the level count is blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub level: u8,
}

impl Cell {
    pub const fn blank(levels: u8) -> Self {
        Cell { ch: ' ', level: levels }
    }
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    levels: u8,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, levels: u8) -> Self {
        let levels = levels.max(1);
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            levels,
            cells: vec![Cell::blank(levels); len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::blank(self.levels))
    }

    fn mark_dirty(&mut self, i: usize) {
        if !self.dirty_all && self.dirty_map.get(i).copied() == Some(false) {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    pub fn stamp(&mut self, x: u16, y: u16, ch: char) {
        if let Some(i) = self.index(x, y) {
            let cell = Cell { ch, level: 0 };
            if self.cells[i] != cell {
                self.cells[i] = cell;
                self.mark_dirty(i);
            }
        }
    }

    pub fn wash(&mut self) {
        for i in 0..self.cells.len() {
            let cell = self.cells[i];
            if cell.level >= self.levels {
                continue;
            }
            let next = cell.level + 1;
            self.cells[i] = if next >= self.levels {
                Cell::blank(self.levels)
            } else {
                Cell { ch: cell.ch, level: next }
            };
            self.mark_dirty(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_sets_a_head_and_marks_it_dirty() {
        let mut f = Frame::new(3, 2, 4);
        f.clear_dirty();
        f.stamp(1, 0, 'V');
        assert_eq!(f.get(1, 0), Some(&Cell { ch: 'V', level: 0 }));
        assert_eq!(f.dirty_indices(), &[1]);
    }

    #[test]
    fn wash_ages_cells_until_blank() {
        let mut f = Frame::new(1, 1, 3);
        f.stamp(0, 0, 'x');
        f.wash();
        assert_eq!(f.get(0, 0), Some(&Cell { ch: 'x', level: 1 }));
        f.wash();
        assert_eq!(f.get(0, 0), Some(&Cell { ch: 'x', level: 2 }));
        f.wash();
        assert_eq!(f.get(0, 0), Some(&Cell::blank(3)));
        // A blank cell is left alone by further washes.
        f.clear_dirty();
        f.wash();
        assert!(f.dirty_indices().is_empty());
    }

    #[test]
    fn out_of_range_stamps_are_clipped() {
        let mut f = Frame::new(2, 2, 4);
        f.clear_dirty();
        f.stamp(2, 0, 'x');
        f.stamp(0, 9, 'x');
        assert!(f.dirty_indices().is_empty());
    }

    #[test]
    fn new_frame_wants_a_full_redraw() {
        let mut f = Frame::new(2, 2, 4);
        assert!(f.is_dirty_all());
        f.clear_dirty();
        assert!(!f.is_dirty_all());
    }
}
