use std::collections::BTreeMap;

use serde::Serialize;

use crate::{constants::SHOPPING_LIST_TITLE, schema::CartIngredientRow};

/*
Shopping list export, rendered as a plain-text document:

Shopping list

egg: 2 pcs
flour: 300 g
sugar: 50 g
*/

/// One merged line of the shopping list. Identity is (name, unit): the
/// same-named ingredient under a different unit stays a separate line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub lines: Vec<ShoppingListLine>,
}

impl ShoppingList {
    /// Merges the raw per-recipe ingredient lines of a cart: group by
    /// (name, unit), sum amounts across every contributing recipe,
    /// order by name. Pure read-side aggregation.
    pub fn from_rows(rows: Vec<CartIngredientRow>) -> Self {
        let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

        for row in rows {
            *totals
                .entry((row.name, row.measurement_unit))
                .or_insert(0) += i64::from(row.amount);
        }

        let lines = totals
            .into_iter()
            .map(|((name, measurement_unit), total_amount)| ShoppingListLine {
                name,
                measurement_unit,
                total_amount,
            })
            .collect();

        Self { lines }
    }
}

impl From<ShoppingList> for String {
    fn from(list: ShoppingList) -> Self {
        let mut document = String::from(SHOPPING_LIST_TITLE);
        document.push('\n');

        for line in &list.lines {
            document.push_str(&format!(
                "\n{}: {} {}",
                line.name, line.total_amount, line.measurement_unit
            ));
        }

        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_merge_across_recipes_ordered_by_name() {
        // Recipe A: flour 200 g, egg 2 pcs. Recipe B: flour 100 g, sugar 50 g.
        let list = ShoppingList::from_rows(vec![
            row("flour", "g", 200),
            row("egg", "pcs", 2),
            row("flour", "g", 100),
            row("sugar", "g", 50),
        ]);

        assert_eq!(
            list.lines,
            vec![
                ShoppingListLine {
                    name: String::from("egg"),
                    measurement_unit: String::from("pcs"),
                    total_amount: 2,
                },
                ShoppingListLine {
                    name: String::from("flour"),
                    measurement_unit: String::from("g"),
                    total_amount: 300,
                },
                ShoppingListLine {
                    name: String::from("sugar"),
                    measurement_unit: String::from("g"),
                    total_amount: 50,
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let list = ShoppingList::from_rows(vec![row("flour", "g", 200), row("flour", "tbsp", 3)]);
        assert_eq!(list.lines.len(), 2);
        assert_eq!(list.lines[0].measurement_unit, "g");
        assert_eq!(list.lines[1].measurement_unit, "tbsp");
    }

    #[test]
    fn renders_the_downloadable_document() {
        let list = ShoppingList::from_rows(vec![
            row("flour", "g", 200),
            row("egg", "pcs", 2),
            row("flour", "g", 100),
            row("sugar", "g", 50),
        ]);

        let document: String = list.into();
        assert_eq!(
            document,
            "Shopping list\n\negg: 2 pcs\nflour: 300 g\nsugar: 50 g"
        );
    }
}
