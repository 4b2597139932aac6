use super::format;
use super::tables::alignment_pattern_positions;
use crate::models::{BitMatrix, MaskPattern, Version};

/// Module grid under construction.
///
/// `reserved` marks function modules (finder, separator, timing, alignment,
/// format, version, dark module); data placement and masking skip them.
#[derive(Debug, Clone)]
pub struct Canvas {
    version: Version,
    modules: BitMatrix,
    reserved: BitMatrix,
}

impl Canvas {
    /// Empty grid with all function patterns drawn and format/version
    /// areas reserved.
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut canvas = Self {
            version,
            modules: BitMatrix::square(size),
            reserved: BitMatrix::square(size),
        };
        canvas.draw_function_patterns();
        canvas
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn size(&self) -> usize {
        self.modules.width()
    }

    pub fn modules(&self) -> &BitMatrix {
        &self.modules
    }

    pub fn into_modules(self) -> BitMatrix {
        self.modules
    }

    pub fn is_reserved(&self, x: usize, y: usize) -> bool {
        self.reserved.get(x, y)
    }

    /// Number of modules left for data and EC bits
    pub fn data_modules_count(&self) -> usize {
        self.size() * self.size() - self.reserved.count_ones()
    }

    pub(crate) fn set_function(&mut self, x: usize, y: usize, dark: bool) {
        self.modules.set(x, y, dark);
        self.reserved.set(x, y, true);
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size();

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            self.set_function(6, i, i % 2 == 0);
            self.set_function(i, 6, i % 2 == 0);
        }

        // Finder patterns + separators
        self.draw_finder(3, 3);
        self.draw_finder(size - 4, 3);
        self.draw_finder(3, size - 4);

        // Alignment patterns, skipping the three finder corners
        let align = alignment_pattern_positions(self.version);
        let last = align.len().saturating_sub(1);
        for (i, &cx) in align.iter().enumerate() {
            for (j, &cy) in align.iter().enumerate() {
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment(cx, cy);
                }
            }
        }

        // Reserve both format areas (and draw the dark module)
        format::draw_format_bits(self, 0);
        format::draw_version_bits(self);
    }

    /// 7x7 finder centered at (cx, cy) plus its one-module light separator
    fn draw_finder(&mut self, cx: usize, cy: usize) {
        let size = self.size() as isize;
        for dy in -4isize..=4 {
            for dx in -4isize..=4 {
                let x = cx as isize + dx;
                let y = cy as isize + dy;
                if (0..size).contains(&x) && (0..size).contains(&y) {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function(x as usize, y as usize, dist != 2 && dist != 4);
                }
            }
        }
    }

    /// 5x5 alignment pattern centered at (cx, cy)
    fn draw_alignment(&mut self, cx: usize, cy: usize) {
        for dy in -2isize..=2 {
            for dx in -2isize..=2 {
                let dist = dx.abs().max(dy.abs());
                let x = (cx as isize + dx) as usize;
                let y = (cy as isize + dy) as usize;
                self.set_function(x, y, dist != 1);
            }
        }
    }

    /// Overwrite a data module; function modules are left untouched
    pub fn set_data(&mut self, x: usize, y: usize, dark: bool) {
        if !self.reserved.get(x, y) {
            self.modules.set(x, y, dark);
        }
    }

    /// Place codeword bits MSB-first in the zig-zag column-pair order,
    /// starting at the bottom-right corner going up. Modules past the last
    /// codeword (remainder bits) stay light. Returns the bits placed.
    pub fn draw_codewords(&mut self, codewords: &[u8]) -> usize {
        let dimension = self.size();
        let total_bits = codewords.len() * 8;
        let mut bit_idx = 0;
        let mut upward = true;
        let mut col = dimension as i32 - 1;

        while col > 0 {
            if col == 6 {
                col -= 1;
                continue;
            }
            for step in 0..dimension {
                let row = if upward { dimension - 1 - step } else { step };
                for c in [col as usize, col as usize - 1] {
                    if self.reserved.get(c, row) {
                        continue;
                    }
                    if bit_idx < total_bits {
                        let byte = codewords[bit_idx >> 3];
                        self.modules.set(c, row, (byte >> (7 - (bit_idx & 7))) & 1 == 1);
                        bit_idx += 1;
                    }
                }
            }
            upward = !upward;
            col -= 2;
        }

        debug_assert_eq!(bit_idx, total_bits);
        bit_idx
    }

    /// XOR `mask` into every non-function module. Applying twice undoes it.
    pub fn apply_mask(&mut self, mask: MaskPattern) {
        let size = self.size();
        for y in 0..size {
            for x in 0..size {
                if !self.reserved.get(x, y) && mask.is_masked(y, x) {
                    self.modules.toggle(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::tables::{num_raw_data_modules, remainder_bits};

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_data_module_count_matches_table() {
        for n in 1..=40 {
            let canvas = Canvas::new(v(n));
            assert_eq!(canvas.data_modules_count(), num_raw_data_modules(v(n)), "v{n}");
        }
    }

    #[test]
    fn test_finder_and_timing() {
        let canvas = Canvas::new(v(1));
        let m = canvas.modules();
        // Finder ring and core
        assert!(m.get(0, 0));
        assert!(m.get(6, 0));
        assert!(!m.get(1, 1));
        assert!(m.get(3, 3));
        // Separator
        assert!(!m.get(7, 0));
        assert!(!m.get(0, 7));
        assert!(canvas.is_reserved(7, 7));
        // Timing
        assert!(m.get(8, 6));
        assert!(!m.get(9, 6));
        assert!(m.get(6, 10));
        // Dark module
        assert!(m.get(8, 13));
    }

    #[test]
    fn test_alignment_pattern_drawn() {
        let canvas = Canvas::new(v(2));
        let m = canvas.modules();
        assert!(m.get(18, 18));
        assert!(!m.get(17, 18));
        assert!(m.get(16, 16));
        assert!(canvas.is_reserved(20, 20));
        assert!(!canvas.is_reserved(21, 21));
    }

    #[test]
    fn test_codewords_fill_all_data_modules() {
        let canvas_v = v(2);
        let mut canvas = Canvas::new(canvas_v);
        let count = num_raw_data_modules(canvas_v) / 8;
        let placed = canvas.draw_codewords(&vec![0xFF; count]);
        assert_eq!(placed, count * 8);
        // Every data module dark except the 7 remainder bits
        let dark_data = (0..canvas.size())
            .flat_map(|y| (0..canvas.size()).map(move |x| (x, y)))
            .filter(|&(x, y)| !canvas.is_reserved(x, y) && canvas.modules().get(x, y))
            .count();
        assert_eq!(dark_data, canvas.data_modules_count() - remainder_bits(canvas_v));
    }

    #[test]
    fn test_first_codeword_position() {
        let mut canvas = Canvas::new(v(1));
        let mut codewords = vec![0u8; 26];
        codewords[0] = 0b1000_0000;
        canvas.draw_codewords(&codewords);
        // MSB of first codeword lands in the bottom-right corner
        assert!(canvas.modules().get(20, 20));
        assert!(!canvas.modules().get(19, 20));
    }

    #[test]
    fn test_mask_is_involution() {
        let mut canvas = Canvas::new(v(3));
        let before = canvas.modules().clone();
        canvas.apply_mask(MaskPattern::Pattern5);
        assert_ne!(canvas.modules(), &before);
        canvas.apply_mask(MaskPattern::Pattern5);
        assert_eq!(canvas.modules(), &before);
    }
}
