//! Property tests: arbitrary borrow/return sequences keep the books balanced

use libris_domain::traits::LibraryStore;
use libris_domain::{BookId, LoanId, NewBook, NewReader, ReaderId};
use libris_store::{SqliteStore, StoreError};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Borrow { book: usize, reader: usize },
    Return { loan: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 0usize..3).prop_map(|(book, reader)| Op::Borrow { book, reader }),
        (0usize..16).prop_map(|loan| Op::Return { loan }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: stock never goes negative, every book's stock equals its
    /// initial count minus its active loans, and no reader exceeds the cap.
    #[test]
    fn test_stock_matches_active_loans(
        initial in proptest::collection::vec(0i64..3, 3),
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let mut store = SqliteStore::in_memory().unwrap();
        let books: Vec<BookId> = initial
            .iter()
            .enumerate()
            .map(|(i, copies)| store.create_book(NewBook::new(format!("Book {}", i), "A", *copies)).unwrap().id)
            .collect();
        let readers: Vec<ReaderId> = (0..3)
            .map(|i| store.create_reader(NewReader::new("R", format!("r{}@example.com", i))).unwrap().id)
            .collect();

        let mut loans: Vec<LoanId> = Vec::new();
        let mut returned: Vec<bool> = Vec::new();

        for op in ops {
            match op {
                Op::Borrow { book, reader } => {
                    let before = store.get_book(books[book]).unwrap().unwrap().available_copies;
                    match store.borrow(books[book], readers[reader]) {
                        Ok(loan) => {
                            loans.push(loan.id);
                            returned.push(false);
                        }
                        Err(StoreError::Validation(_)) => {
                            let after = store.get_book(books[book]).unwrap().unwrap().available_copies;
                            prop_assert_eq!(before, after);
                        }
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
                Op::Return { loan } if loan < loans.len() => {
                    let result = store.return_loan(loans[loan]);
                    if returned[loan] {
                        prop_assert!(matches!(result, Err(StoreError::Conflict(_))));
                    } else {
                        prop_assert!(result.is_ok());
                        returned[loan] = true;
                    }
                }
                Op::Return { .. } => {}
            }

            let mut active_per_book: HashMap<BookId, i64> = HashMap::new();
            let mut active_per_reader: HashMap<ReaderId, usize> = HashMap::new();
            for (id, done) in loans.iter().zip(&returned) {
                if !done {
                    let loan = store.get_loan(*id).unwrap().unwrap();
                    *active_per_book.entry(loan.book_id).or_default() += 1;
                    *active_per_reader.entry(loan.reader_id).or_default() += 1;
                }
            }

            for (book, start) in books.iter().zip(&initial) {
                let stock = store.get_book(*book).unwrap().unwrap().available_copies;
                prop_assert!(stock >= 0);
                prop_assert_eq!(stock, start - active_per_book.get(book).copied().unwrap_or(0));
            }
            for reader in &readers {
                let held = store.active_books_for_reader(*reader).unwrap().len();
                prop_assert!(held <= 3);
                prop_assert_eq!(held, active_per_reader.get(reader).copied().unwrap_or(0));
            }
        }
    }
}
