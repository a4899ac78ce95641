//! Drives the tracker with the classic workload: an eight-queens search whose
//! result is written into a tracker-allocated arena block.
//!
//! The interesting output is not the board, it is the stats line after each step:
//! usage rises by exactly the requested sizes and returns to zero once every
//! handle has been freed.
//!
//! Run with: `cargo run --example eight_queens`

use heap_ledger::{FixedArena, HeapTracker};

const ARENA_CAPACITY: usize = 64 * 1024;

const BOARD_SIZE: usize = 8;
const BOARD_BYTES: usize = BOARD_SIZE * BOARD_SIZE;

fn main() {
    let mut tracker = HeapTracker::new(FixedArena::with_capacity(ARENA_CAPACITY));
    println!("initial: {}", tracker.stats());

    // A toggle probe: allocate, observe, free, observe.
    let probe = tracker
        .allocate(256)
        .expect("a fresh arena can satisfy a 256 byte probe");
    println!("after probe allocation: {}", tracker.stats());

    tracker.deallocate(Some(probe));
    println!("after probe free: {}", tracker.stats());

    // The search workload: solve into a fixed-size result buffer.
    let result = tracker
        .allocate(BOARD_BYTES)
        .expect("a fresh arena can satisfy the board buffer");
    println!("after board allocation: {}", tracker.stats());

    let board = solve();
    tracker.arena_mut().write_bytes(result, &board);

    // Read the result back out of the arena, the way a host would.
    let cells = tracker.arena().read_bytes(result, BOARD_BYTES).to_vec();
    for row in cells.chunks(BOARD_SIZE) {
        let rendered: String = row
            .iter()
            .map(|&cell| if cell == 1 { 'Q' } else { '.' })
            .collect();
        println!("  {rendered}");
    }

    tracker.deallocate(Some(result));
    println!("after board free: {}", tracker.stats());
}

/// Finds the first eight-queens solution and renders it as a row-major board of
/// 0/1 bytes.
fn solve() -> [u8; BOARD_BYTES] {
    let mut cols = [false; BOARD_SIZE];
    let mut up = [false; 2 * BOARD_SIZE - 1];
    let mut down = [false; 2 * BOARD_SIZE - 1];
    let mut queens = [0_usize; BOARD_SIZE];
    assert!(
        place(0, &mut cols, &mut up, &mut down, &mut queens),
        "the eight-queens problem is known to be solvable"
    );

    let mut board = [0_u8; BOARD_BYTES];
    for (row, &col) in queens.iter().enumerate() {
        board[row * BOARD_SIZE + col] = 1;
    }
    board
}

fn place(
    row: usize,
    cols: &mut [bool; BOARD_SIZE],
    up: &mut [bool; 2 * BOARD_SIZE - 1],
    down: &mut [bool; 2 * BOARD_SIZE - 1],
    queens: &mut [usize; BOARD_SIZE],
) -> bool {
    if row == BOARD_SIZE {
        return true;
    }

    for col in 0..BOARD_SIZE {
        let up_index = row + col;
        let down_index = BOARD_SIZE - 1 + row - col;
        if cols[col] || up[up_index] || down[down_index] {
            continue;
        }

        cols[col] = true;
        up[up_index] = true;
        down[down_index] = true;
        queens[row] = col;

        if place(row + 1, cols, up, down, queens) {
            return true;
        }

        cols[col] = false;
        up[up_index] = false;
        down[down_index] = false;
    }

    false
}
