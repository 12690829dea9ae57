#[cfg(test)]
mod helpers;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod filter_tests;
