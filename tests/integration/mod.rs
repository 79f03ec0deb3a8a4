mod helpers;
mod test_cli;
mod test_init;
mod test_release;
mod test_status;
