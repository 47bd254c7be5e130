mod persons;
