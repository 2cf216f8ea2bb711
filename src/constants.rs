pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 50;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

/// How many of an author's recipes are embedded in a subscription entry.
pub const RECIPE_PREVIEW_COUNT: i64 = 3;

pub const AMOUNT_MIN: i64 = 1;
/// Amounts of 10000 and above are rejected as nonsensical input.
pub const AMOUNT_LIMIT: i64 = 10000;

pub const TAG_NAME_MAX_LEN: usize = 32;
pub const TAG_SLUG_MAX_LEN: usize = 32;
pub const TAG_COLOR_LEN: usize = 7;

pub const INGREDIENT_NAME_MAX_LEN: usize = 64;
pub const MEASUREMENT_UNIT_MAX_LEN: usize = 32;

pub const RECIPE_NAME_MIN_LEN: usize = 3;
pub const RECIPE_NAME_MAX_LEN: usize = 64;
pub const RECIPE_TEXT_MAX_LEN: usize = 2048;
pub const COOKING_TIME_DEFAULT: i32 = 5;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;

pub const SHOPPING_LIST_TITLE: &str = "Shopping list";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
