mod test_leave;
