mod browse;
mod favorites;
mod helpers;
mod key;
mod plan;
mod prefs;
mod recipes;
mod review;

pub(crate) use browse::cmd_browse;
pub(crate) use favorites::{cmd_fav_list, cmd_fav_remove, cmd_fav_toggle};
pub(crate) use helpers::resolve_filters;
pub(crate) use key::{cmd_key_set, cmd_key_show};
pub(crate) use plan::{
    cmd_plan_add, cmd_plan_clear, cmd_plan_generate, cmd_plan_remove, cmd_plan_show,
    cmd_plan_start,
};
pub(crate) use prefs::{DarkModeArg, cmd_dark_mode, cmd_prefs_set, cmd_prefs_show};
pub(crate) use recipes::{cmd_pantry, cmd_random, cmd_search, cmd_show, cmd_similar, cmd_suggest};
pub(crate) use review::{cmd_review_add, cmd_review_list};
