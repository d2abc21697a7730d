mod unpack_archive;
